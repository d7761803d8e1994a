#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Polyjob Core
//!
//! A minimal job queue over a shared document store.
//!
//! ## Overview
//!
//! Clients submit typed jobs into one collection. A periodic scheduler claims a
//! batch of Pending jobs, hands each one to the handler registered for its
//! variant and records a terminal status.
//!
//! ## Architecture
//!
//! - **Polymorphic model**: every variant shares the common job fields and
//!   carries a tagged payload, so status queries span all variants.
//! - **Conditional claiming**: a claim reads Pending jobs, then moves them to
//!   Processing with an update that only applies to records still Pending.
//!   Concurrent claimers never receive the same job.
//! - **Per-job containment**: handler errors and panics finalize the job as
//!   Failed without affecting the rest of the batch.
//!
//! ## Module Organization
//!
//! - [`models`] - Job entity, variants, statuses, pagination
//! - [`store`] - Store trait with in-memory and PostgreSQL implementations
//! - [`orchestration`] - Claimer, dispatcher, finalizer and scheduler loop
//! - [`registry`] - Variant to handler table
//! - [`services`] - Submission and listing
//! - [`config`] - Layered configuration
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Crate error type
//!
//! ## Quick Start
//!
//! ```rust
//! use polyjob_core::models::NewJob;
//! use polyjob_core::orchestration::{JobClaimer, JobDispatcher};
//! use polyjob_core::registry::HandlerRegistry;
//! use polyjob_core::store::{InMemoryJobStore, JobStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryJobStore::arc();
//! store.insert(NewJob::foo("resize-images", 42)).await?;
//!
//! let claimer = JobClaimer::new(store.clone(), "worker-1".to_string());
//! let dispatcher = JobDispatcher::new(
//!     store.clone(),
//!     Arc::new(HandlerRegistry::with_default_handlers()),
//! );
//!
//! let batch = claimer.claim_batch(5).await?;
//! let report = dispatcher.process_batch(batch).await;
//! assert_eq!(report.succeeded, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod services;
pub mod store;

pub use config::{ConfigManager, PolyjobConfig};
pub use error::{PolyjobError, Result};
pub use models::{Job, JobId, JobPayload, JobRequest, JobStatus, JobType, NewJob};
pub use orchestration::{JobClaimer, JobDispatcher, JobScheduler};
pub use store::{InMemoryJobStore, JobStore, PgJobStore};
