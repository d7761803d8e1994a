//! # Job Handlers
//!
//! Variant-specific processing. Each handler serves exactly one [`JobType`]
//! and is looked up through the [`HandlerRegistry`](crate::registry::HandlerRegistry).
//! The shipped handlers only log the variant field; real work plugs in by
//! registering another handler for the same type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PolyjobError, Result};
use crate::models::{Job, JobPayload, JobType};

/// Processing logic for one job variant
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The variant this handler processes
    fn job_type(&self) -> JobType;

    /// Perform the variant's work. Must not re-read or re-claim the job.
    async fn process(&self, job: &Job) -> Result<()>;
}

/// What happened when a claimed job was handed to its handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingOutcome {
    /// The handler returned normally
    Completed,
    /// The handler failed, panicked, or no handler was registered
    Errored(String),
}

impl ProcessingOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Errored(_))
    }
}

impl From<Result<()>> for ProcessingOutcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(e) => Self::Errored(e.to_string()),
        }
    }
}

fn payload_mismatch(expected: JobType, job: &Job) -> PolyjobError {
    PolyjobError::ProcessingError(format!(
        "{expected} handler received a {} job ({})",
        job.job_type(),
        job.id
    ))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FooJobHandler;

#[async_trait]
impl JobHandler for FooJobHandler {
    fn job_type(&self) -> JobType {
        JobType::Foo
    }

    async fn process(&self, job: &Job) -> Result<()> {
        let JobPayload::Foo { foo } = job.payload else {
            return Err(payload_mismatch(JobType::Foo, job));
        };
        info!(job_id = %job.id, name = %job.name, foo = foo, "Processing Foo job");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BarJobHandler;

#[async_trait]
impl JobHandler for BarJobHandler {
    fn job_type(&self) -> JobType {
        JobType::Bar
    }

    async fn process(&self, job: &Job) -> Result<()> {
        let JobPayload::Bar { bar } = job.payload else {
            return Err(payload_mismatch(JobType::Bar, job));
        };
        info!(job_id = %job.id, name = %job.name, bar = bar, "Processing Bar job");
        Ok(())
    }
}
