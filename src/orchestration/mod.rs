//! # Orchestration
//!
//! The claim, dispatch and finalize protocol plus the timer loop driving it.
//!
//! - [`job_claimer`]: moves a bounded batch of Pending jobs to Processing
//! - [`job_dispatcher`]: runs the variant handler and finalizes each job
//! - [`job_finalizer`]: conditional terminal status write
//! - [`job_handler`]: handler trait and the built-in variant handlers
//! - [`outcome`]: pluggable terminal status decision
//! - [`scheduler`]: interval-driven ticks

pub mod job_claimer;
pub mod job_dispatcher;
pub mod job_finalizer;
pub mod job_handler;
pub mod outcome;
pub mod scheduler;

pub use job_claimer::{JobClaimer, JobClaimerConfig};
pub use job_dispatcher::{BatchReport, DispatchReport, JobDispatcher};
pub use job_finalizer::{FinalizationAction, JobFinalizer};
pub use job_handler::{BarJobHandler, FooJobHandler, JobHandler, ProcessingOutcome};
pub use outcome::{OutcomeResolver, RandomOutcome, ResultOutcome};
pub use scheduler::{JobScheduler, TickReport};
