//! # Models
//!
//! The polymorphic job entity, its lifecycle states and pagination types.

pub mod job;
pub mod pagination;
pub mod status;

pub use job::{Job, JobId, JobPayload, JobRequest, JobType, NewJob};
pub use pagination::{Page, PageRequest};
pub use status::JobStatus;
