//! # Job Finalizer
//!
//! Writes the terminal status that ends a job's lifecycle. The write is
//! conditional on the job still being Processing, so finalizing twice, or
//! finalizing a job this tick never claimed, changes nothing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::error::{PolyjobError, Result};
use crate::models::{JobId, JobStatus};
use crate::store::JobStore;

/// Result of a finalize call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizationAction {
    /// The job moved from Processing to the given terminal status
    Finalized(JobStatus),
    /// The job was not Processing (already terminal, never claimed, or missing)
    AlreadyFinalized,
}

pub struct JobFinalizer {
    store: Arc<dyn JobStore>,
}

impl JobFinalizer {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn finalize(&self, job_id: JobId, status: JobStatus) -> Result<FinalizationAction> {
        if !status.is_terminal() {
            return Err(PolyjobError::StateTransitionError(format!(
                "cannot finalize job {job_id} as {status}: not a terminal status"
            )));
        }

        let updated = self
            .store
            .update_status_for_id(job_id, JobStatus::Processing, status)
            .await
            .map_err(|e| {
                error!(job_id = %job_id, status = %status, "Failed to finalize job: {}", e);
                PolyjobError::from(e)
            })?;

        if updated {
            debug!(job_id = %job_id, status = %status, "Job finalized");
            Ok(FinalizationAction::Finalized(status))
        } else {
            warn!(
                job_id = %job_id,
                status = %status,
                "Job was not finalized (not processing or already finalized)"
            );
            Ok(FinalizationAction::AlreadyFinalized)
        }
    }
}
