//! # Job Claimer
//!
//! ## Architecture: Conditional Batch Claiming
//!
//! Claiming is two store operations: a bounded read of Pending jobs, then one
//! bulk update moving exactly those ids from Pending to Processing. The update
//! only applies to records that are still Pending when it runs, and only the
//! ids it actually moved are returned. Two claimers reading the same Pending
//! jobs therefore split them: each id ends up in at most one returned batch.
//!
//! No lock is taken in-process; the store's conditional write is the only
//! synchronization, so the guarantee also holds across processes sharing a
//! store.
//!
//! ## Usage
//!
//! ```rust
//! use polyjob_core::orchestration::job_claimer::JobClaimer;
//! use polyjob_core::store::InMemoryJobStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let claimer = JobClaimer::new(InMemoryJobStore::arc(), "scheduler-1".to_string());
//!
//! for job in claimer.claim_batch(5).await? {
//!     println!("Claimed {} ({})", job.id, job.job_type());
//! }
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::config::SchedulerConfig;
use crate::error::{PolyjobError, Result};
use crate::models::{Job, JobId, JobStatus};
use crate::store::JobStore;

/// Configuration for claiming behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobClaimerConfig {
    /// Maximum number of jobs claimed in a single batch
    pub max_batch_size: usize,
}

impl Default for JobClaimerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
        }
    }
}

impl From<&SchedulerConfig> for JobClaimerConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            max_batch_size: config.max_batch_size,
        }
    }
}

/// Claims batches of Pending jobs for one scheduler instance
pub struct JobClaimer {
    store: Arc<dyn JobStore>,
    claimer_id: String,
    config: JobClaimerConfig,
}

impl JobClaimer {
    pub fn new(store: Arc<dyn JobStore>, claimer_id: String) -> Self {
        Self::with_config(store, claimer_id, JobClaimerConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn JobStore>,
        claimer_id: String,
        config: JobClaimerConfig,
    ) -> Self {
        Self {
            store,
            claimer_id,
            config,
        }
    }

    /// Claim up to `limit` Pending jobs, moving them to Processing
    ///
    /// The returned jobs already carry `JobStatus::Processing`. Jobs that were
    /// read but taken by a concurrent claimer are left out and stay with that
    /// claimer; nothing read here is left half-claimed. A failed read or a
    /// failed bulk update returns the store error and claims nothing.
    #[instrument(skip(self), fields(claimer_id = %self.claimer_id))]
    pub async fn claim_batch(&self, limit: usize) -> Result<Vec<Job>> {
        let actual_limit = limit.min(self.config.max_batch_size);
        if actual_limit == 0 {
            return Ok(Vec::new());
        }

        debug!(limit = actual_limit, "Claiming pending jobs");

        let candidates = self
            .store
            .find_by_status(JobStatus::Pending, actual_limit)
            .await
            .map_err(|e| {
                error!("Failed to read pending jobs: {}", e);
                PolyjobError::from(e)
            })?;

        if candidates.is_empty() {
            debug!("No pending jobs available for claiming");
            return Ok(Vec::new());
        }

        let candidate_ids: Vec<JobId> = candidates.iter().map(|job| job.id).collect();

        let claimed_at: HashMap<JobId, DateTime<Utc>> = self
            .store
            .update_status_for_ids(&candidate_ids, JobStatus::Pending, JobStatus::Processing)
            .await
            .map_err(|e| {
                error!(
                    candidate_count = candidate_ids.len(),
                    "Failed to mark jobs as processing: {}", e
                );
                PolyjobError::from(e)
            })?
            .into_iter()
            .map(|update| (update.id, update.updated_at))
            .collect();

        // Carry the store's own write timestamp onto each won job
        let claimed: Vec<Job> = candidates
            .into_iter()
            .filter_map(|mut job| {
                let updated_at = *claimed_at.get(&job.id)?;
                job.status = JobStatus::Processing;
                job.updated_at = updated_at;
                Some(job)
            })
            .collect();

        let lost = candidate_ids.len() - claimed.len();
        if claimed.is_empty() {
            debug!(lost_to_other_claimers = lost, "Every candidate was claimed elsewhere");
        } else {
            info!(
                claimed_count = claimed.len(),
                lost_to_other_claimers = lost,
                "Successfully claimed jobs"
            );
        }

        Ok(claimed)
    }

    pub fn claimer_id(&self) -> &str {
        &self.claimer_id
    }

    pub fn config(&self) -> &JobClaimerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewJob;
    use crate::store::InMemoryJobStore;

    #[test]
    fn test_claimer_config_defaults() {
        let config = JobClaimerConfig::default();
        assert_eq!(config.max_batch_size, 100);
    }

    #[tokio::test]
    async fn test_claim_marks_jobs_processing() {
        let store = InMemoryJobStore::arc();
        for i in 0..3 {
            store.insert(NewJob::foo(format!("job-{i}"), i)).await.unwrap();
        }
        let claimer = JobClaimer::new(store.clone(), "test".to_string());

        let claimed = claimer.claim_batch(5).await.unwrap();

        assert_eq!(claimed.len(), 3);
        assert!(claimed.iter().all(|job| job.status == JobStatus::Processing));
        for job in &claimed {
            let stored = store.find_by_id(job.id).await.unwrap().unwrap();
            assert_eq!(job.updated_at, stored.updated_at);
        }
        assert!(store
            .find_by_status(JobStatus::Pending, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_limit_capped_by_config() {
        let store = InMemoryJobStore::arc();
        for i in 0..4 {
            store.insert(NewJob::bar(format!("job-{i}"), i)).await.unwrap();
        }
        let claimer = JobClaimer::with_config(
            store.clone(),
            "capped".to_string(),
            JobClaimerConfig { max_batch_size: 2 },
        );

        assert_eq!(claimer.claim_batch(10).await.unwrap().len(), 2);
        assert_eq!(claimer.claim_batch(0).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_only_pending_jobs_are_claimed() {
        let store = InMemoryJobStore::arc();
        let a = store.insert(NewJob::foo("a", 1)).await.unwrap();
        let b = store.insert(NewJob::foo("b", 2)).await.unwrap();
        store
            .update_status_for_id(b.id, JobStatus::Pending, JobStatus::Processing)
            .await
            .unwrap();
        let claimer = JobClaimer::new(store.clone(), "test".to_string());

        let claimed = claimer.claim_batch(5).await.unwrap();
        let ids: Vec<JobId> = claimed.iter().map(|job| job.id).collect();

        assert_eq!(ids, vec![a.id]);
        assert!(claimer.claim_batch(5).await.unwrap().is_empty());
    }
}
