//! # Store Adapter
//!
//! The query/update surface the scheduler needs from the document store.
//!
//! ## Contract
//!
//! - All job variants share one collection; queries filter on common fields only
//!   and decode the variant payload after the read.
//! - Status writes are conditional on the record's current status. That
//!   compare-and-swap is the only synchronization between concurrent claimers.
//! - No transaction spans two operations.
//! - Every status write refreshes `updated_at`.

pub mod errors;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Job, JobId, JobStatus, NewJob};

pub use errors::{StoreError, StoreResult};
pub use memory::InMemoryJobStore;
pub use postgres::PgJobStore;

/// A status write that applied, with the `updated_at` the store recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: JobId,
    pub updated_at: DateTime<Utc>,
}

/// Persistence boundary for jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new Pending job, assigning its id and timestamps
    async fn insert(&self, new_job: NewJob) -> StoreResult<Job>;

    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<Job>>;

    /// Up to `limit` jobs with `status`, in stable insertion order
    ///
    /// Records that cannot be decoded into a known variant are logged and
    /// skipped, so they never block the jobs behind them.
    async fn find_by_status(&self, status: JobStatus, limit: usize) -> StoreResult<Vec<Job>>;

    /// Move every listed job still in `expected` to `new_status`
    ///
    /// Ids not present, or whose status is no longer `expected`, are left
    /// untouched. Returns one entry per record actually updated.
    async fn update_status_for_ids(
        &self,
        ids: &[JobId],
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<Vec<StatusUpdate>>;

    /// Single-record conditional update; `false` means nothing changed
    async fn update_status_for_id(
        &self,
        id: JobId,
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<bool>;

    /// Jobs of every variant in insertion order; undecodable records are skipped
    async fn find_page(&self, offset: u64, limit: u64) -> StoreResult<Vec<Job>>;

    /// Total number of jobs, ignoring any paging
    async fn count(&self) -> StoreResult<u64>;
}
