//! # Job Service
//!
//! The operations a submission or listing front end calls: translate a
//! [`JobRequest`] into a Pending job of the matching variant, and page through
//! jobs of every variant with a total count.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::logging::log_job_operation;
use crate::models::{Job, JobId, JobRequest, NewJob, Page, PageRequest};
use crate::store::JobStore;

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Create a Pending job from a client request
    #[instrument(skip(self, request), fields(name = %request.name, job_type = %request.job_type))]
    pub async fn submit(&self, request: JobRequest) -> Result<Job> {
        self.create(NewJob::from(request)).await
    }

    pub async fn create(&self, new_job: NewJob) -> Result<Job> {
        new_job.validate()?;
        let job = self.store.insert(new_job).await?;
        log_job_operation("submit", job.id, job.job_type(), job.status, None);
        Ok(job)
    }

    pub async fn get(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// One page of jobs of every variant, plus the unpaged total
    pub async fn list(&self, request: PageRequest) -> Result<Page<Job>> {
        request.validate()?;
        let items = self
            .store
            .find_page(request.offset(), request.limit())
            .await?;
        let total = self.store.count().await?;
        debug!(page = request.page, size = request.size, total = total, "Listed jobs");
        Ok(Page::new(items, request, total))
    }
}
