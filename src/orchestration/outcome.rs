//! # Outcome Resolution
//!
//! Decides the terminal status written for a processed job. The dispatcher
//! calls the resolver once per job with the job and its processing outcome.
//! Errored outcomes always finalize as Failed; a resolver answering with a
//! non-terminal status is treated as Failed as well.

use std::sync::Arc;

use crate::config::OutcomePolicy;
use crate::models::{Job, JobStatus};
use crate::orchestration::job_handler::ProcessingOutcome;

pub trait OutcomeResolver: Send + Sync {
    fn resolve(&self, job: &Job, outcome: &ProcessingOutcome) -> JobStatus;
}

impl<F> OutcomeResolver for F
where
    F: Fn(&Job, &ProcessingOutcome) -> JobStatus + Send + Sync,
{
    fn resolve(&self, job: &Job, outcome: &ProcessingOutcome) -> JobStatus {
        self(job, outcome)
    }
}

/// Success when the handler completed, Failed otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultOutcome;

impl OutcomeResolver for ResultOutcome {
    fn resolve(&self, _job: &Job, outcome: &ProcessingOutcome) -> JobStatus {
        match outcome {
            ProcessingOutcome::Completed => JobStatus::Success,
            ProcessingOutcome::Errored(_) => JobStatus::Failed,
        }
    }
}

/// Coin flip between Success and Failed for completed jobs
///
/// Placeholder policy for demos and load tests; carries no business meaning.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOutcome;

impl OutcomeResolver for RandomOutcome {
    fn resolve(&self, _job: &Job, outcome: &ProcessingOutcome) -> JobStatus {
        match outcome {
            ProcessingOutcome::Completed if fastrand::bool() => JobStatus::Success,
            _ => JobStatus::Failed,
        }
    }
}

impl OutcomePolicy {
    pub fn resolver(&self) -> Arc<dyn OutcomeResolver> {
        match self {
            OutcomePolicy::Result => Arc::new(ResultOutcome),
            OutcomePolicy::Random => Arc::new(RandomOutcome),
        }
    }
}
