//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

use polyjob_core::models::{Job, JobId, JobStatus, NewJob};
use polyjob_core::orchestration::{JobClaimer, JobDispatcher, JobScheduler};
use polyjob_core::registry::HandlerRegistry;
use polyjob_core::config::SchedulerConfig;
use polyjob_core::store::{InMemoryJobStore, JobStore, StatusUpdate, StoreError, StoreResult};

/// Insert `count` Pending jobs alternating between Foo and Bar
pub async fn seed_mixed(store: &dyn JobStore, count: usize) -> Vec<Job> {
    let mut jobs = Vec::with_capacity(count);
    for i in 0..count {
        let value = i as i32;
        let new_job = if i % 2 == 0 {
            NewJob::foo(format!("foo-{i}"), value)
        } else {
            NewJob::bar(format!("bar-{i}"), value)
        };
        jobs.push(store.insert(new_job).await.expect("seed insert"));
    }
    jobs
}

pub async fn statuses(store: &dyn JobStore, ids: &[JobId]) -> Vec<JobStatus> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let job = store.find_by_id(*id).await.unwrap().expect("job exists");
        out.push(job.status);
    }
    out
}

pub async fn count_with_status(store: &dyn JobStore, status: JobStatus) -> usize {
    store.find_by_status(status, usize::MAX).await.unwrap().len()
}

pub fn build_scheduler(store: Arc<dyn JobStore>, config: SchedulerConfig) -> Arc<JobScheduler> {
    let claimer = Arc::new(JobClaimer::new(store.clone(), "integration".to_string()));
    let dispatcher = Arc::new(
        JobDispatcher::new(store, Arc::new(HandlerRegistry::with_default_handlers()))
            .with_mode(config.dispatch_mode),
    );
    Arc::new(JobScheduler::new(claimer, dispatcher, config))
}

/// Wraps the in-memory store and fails selected operations on demand
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryJobStore,
    pub fail_reads: AtomicBool,
    pub fail_bulk_updates: AtomicBool,
    pub fail_single_updates: AtomicBool,
    /// Only the first N ids of a bulk update reach the inner store
    pub bulk_update_cap: Mutex<Option<usize>>,
}

impl FlakyStore {
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn check(flag: &AtomicBool, operation: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::unavailable(operation, "injected outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn insert(&self, new_job: NewJob) -> StoreResult<Job> {
        self.inner.insert(new_job).await
    }

    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<Job>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_status(&self, status: JobStatus, limit: usize) -> StoreResult<Vec<Job>> {
        Self::check(&self.fail_reads, "find_by_status")?;
        self.inner.find_by_status(status, limit).await
    }

    async fn update_status_for_ids(
        &self,
        ids: &[JobId],
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<Vec<StatusUpdate>> {
        Self::check(&self.fail_bulk_updates, "update_status_for_ids")?;
        let cap = *self.bulk_update_cap.lock();
        let ids = match cap {
            Some(cap) => &ids[..cap.min(ids.len())],
            None => ids,
        };
        self.inner.update_status_for_ids(ids, expected, new_status).await
    }

    async fn update_status_for_id(
        &self,
        id: JobId,
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<bool> {
        Self::check(&self.fail_single_updates, "update_status_for_id")?;
        self.inner.update_status_for_id(id, expected, new_status).await
    }

    async fn find_page(&self, offset: u64, limit: u64) -> StoreResult<Vec<Job>> {
        self.inner.find_page(offset, limit).await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.inner.count().await
    }
}

/// Holds every claimer between its read and its bulk update until all
/// `parties` claimers have read, forcing their reads to overlap
pub struct OverlappingReadsStore {
    pub inner: InMemoryJobStore,
    barrier: Barrier,
}

impl OverlappingReadsStore {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryJobStore::new(),
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl JobStore for OverlappingReadsStore {
    async fn insert(&self, new_job: NewJob) -> StoreResult<Job> {
        self.inner.insert(new_job).await
    }

    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<Job>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_status(&self, status: JobStatus, limit: usize) -> StoreResult<Vec<Job>> {
        let jobs = self.inner.find_by_status(status, limit).await?;
        self.barrier.wait().await;
        Ok(jobs)
    }

    async fn update_status_for_ids(
        &self,
        ids: &[JobId],
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<Vec<StatusUpdate>> {
        self.inner.update_status_for_ids(ids, expected, new_status).await
    }

    async fn update_status_for_id(
        &self,
        id: JobId,
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<bool> {
        self.inner.update_status_for_id(id, expected, new_status).await
    }

    async fn find_page(&self, offset: u64, limit: u64) -> StoreResult<Vec<Job>> {
        self.inner.find_page(offset, limit).await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.inner.count().await
    }
}
