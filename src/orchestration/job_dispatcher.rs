//! # Job Dispatcher
//!
//! Routes each claimed job to the handler registered for its variant, turns
//! whatever the handler did into a [`ProcessingOutcome`], asks the
//! [`OutcomeResolver`] for a terminal status and finalizes the job.
//!
//! Every claimed job gets exactly one finalize write. Handler errors, panics
//! and missing handlers finalize as Failed and never abort the rest of the
//! batch; so does a resolver that panics. A failed finalize write leaves the job in Processing; it is logged
//! and counted in the [`BatchReport`].

use futures::future::join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::config::DispatchMode;
use crate::logging::log_job_operation;
use crate::models::{Job, JobId, JobStatus, JobType};
use crate::orchestration::job_finalizer::{FinalizationAction, JobFinalizer};
use crate::orchestration::job_handler::ProcessingOutcome;
use crate::orchestration::outcome::{OutcomeResolver, ResultOutcome};
use crate::registry::HandlerRegistry;
use crate::store::JobStore;

/// What happened to one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub job_id: JobId,
    pub job_type: JobType,
    pub outcome: ProcessingOutcome,
    /// Terminal status the dispatcher tried to write
    pub resolved_status: JobStatus,
    /// `None` when the finalize write itself failed
    pub finalization: Option<FinalizationAction>,
    pub finalize_error: Option<String>,
}

/// Aggregate of one processed batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub already_finalized: usize,
    pub finalize_failures: usize,
    pub reports: Vec<DispatchReport>,
}

impl BatchReport {
    fn from_reports(reports: Vec<DispatchReport>) -> Self {
        let mut batch = BatchReport {
            processed: reports.len(),
            ..Default::default()
        };
        for report in &reports {
            match report.finalization {
                Some(FinalizationAction::Finalized(JobStatus::Success)) => batch.succeeded += 1,
                Some(FinalizationAction::Finalized(_)) => batch.failed += 1,
                Some(FinalizationAction::AlreadyFinalized) => batch.already_finalized += 1,
                None => batch.finalize_failures += 1,
            }
        }
        batch.reports = reports;
        batch
    }
}

pub struct JobDispatcher {
    registry: Arc<HandlerRegistry>,
    finalizer: JobFinalizer,
    resolver: Arc<dyn OutcomeResolver>,
    mode: DispatchMode,
}

impl JobDispatcher {
    /// Dispatcher with the default result-based resolver, processing sequentially
    pub fn new(store: Arc<dyn JobStore>, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            finalizer: JobFinalizer::new(store),
            resolver: Arc::new(ResultOutcome),
            mode: DispatchMode::Sequential,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn OutcomeResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Process one claimed job and write its terminal status
    #[instrument(skip(self, job), fields(job_id = %job.id, job_type = %job.job_type()))]
    pub async fn process_job(&self, job: &Job) -> DispatchReport {
        let outcome = self.run_handler(job).await;
        let resolved_status = self.resolve_status(job, &outcome);

        let (finalization, finalize_error) =
            match self.finalizer.finalize(job.id, resolved_status).await {
                Ok(action) => {
                    if let FinalizationAction::Finalized(status) = action {
                        let details = match &outcome {
                            ProcessingOutcome::Errored(message) => Some(message.as_str()),
                            ProcessingOutcome::Completed => None,
                        };
                        log_job_operation("finalize", job.id, job.job_type(), status, details);
                    }
                    (Some(action), None)
                }
                Err(e) => {
                    error!(
                        status = %resolved_status,
                        "Finalize write failed; job remains processing: {}", e
                    );
                    (None, Some(e.to_string()))
                }
            };

        DispatchReport {
            job_id: job.id,
            job_type: job.job_type(),
            outcome,
            resolved_status,
            finalization,
            finalize_error,
        }
    }

    /// Process every job of a claimed batch; order between jobs is not guaranteed
    pub async fn process_batch(&self, jobs: Vec<Job>) -> BatchReport {
        if jobs.is_empty() {
            return BatchReport::default();
        }

        debug!(batch_size = jobs.len(), mode = ?self.mode, "Dispatching claimed batch");

        let reports = match self.mode {
            DispatchMode::Sequential => {
                let mut reports = Vec::with_capacity(jobs.len());
                for job in &jobs {
                    reports.push(self.process_job(job).await);
                }
                reports
            }
            DispatchMode::Concurrent => join_all(jobs.iter().map(|job| self.process_job(job))).await,
        };

        BatchReport::from_reports(reports)
    }

    async fn run_handler(&self, job: &Job) -> ProcessingOutcome {
        let Some(handler) = self.registry.get(job.job_type()) else {
            warn!("No handler registered for job type");
            return ProcessingOutcome::Errored(format!(
                "no handler registered for job type {}",
                job.job_type()
            ));
        };

        match AssertUnwindSafe(handler.process(job)).catch_unwind().await {
            Ok(result) => {
                if let Err(e) = &result {
                    warn!("Job handler failed: {}", e);
                }
                ProcessingOutcome::from(result)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Job handler panicked: {}", message);
                ProcessingOutcome::Errored(format!("handler panicked: {message}"))
            }
        }
    }

    fn resolve_status(&self, job: &Job, outcome: &ProcessingOutcome) -> JobStatus {
        let status =
            match panic::catch_unwind(AssertUnwindSafe(|| self.resolver.resolve(job, outcome))) {
                Ok(status) => status,
                Err(panic) => {
                    error!(
                        "Outcome resolver panicked, finalizing as failed: {}",
                        panic_message(panic.as_ref())
                    );
                    return JobStatus::Failed;
                }
            };
        if !status.is_terminal() {
            warn!(status = %status, "Outcome resolver returned a non-terminal status; using failed");
            return JobStatus::Failed;
        }
        if outcome.is_error() && status != JobStatus::Failed {
            warn!(status = %status, "Errored job resolved as {}; using failed", status);
            return JobStatus::Failed;
        }
        status
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
