//! # Services
//!
//! Submission and listing operations over the job store.

pub mod job_service;

pub use job_service::JobService;
