//! # Job Model
//!
//! Polymorphic job entity shared by every job variant.
//!
//! ## Overview
//!
//! All variants live in one logical collection. Common fields (`id`, `name`,
//! `status`, timestamps) are queried uniformly; the variant lives in a tagged
//! [`JobPayload`] whose discriminant is stored next to the variant's own field.
//!
//! ## Document Shape
//!
//! ```json
//! {
//!   "id": "7c1f0e9a-5d4e-4f47-9a53-0d7bb0f5c1a2",
//!   "name": "nightly-report",
//!   "status": "pending",
//!   "createdAt": "2024-01-01T00:00:00Z",
//!   "updatedAt": "2024-01-01T00:00:00Z",
//!   "type": "Foo",
//!   "foo": 42
//! }
//! ```
//!
//! ## Adding a Variant
//!
//! Add a `JobType` member, a matching `JobPayload` variant, and register a
//! handler for it. Claiming and dispatching do not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::status::JobStatus;
use crate::error::{PolyjobError, Result};

pub type JobId = Uuid;

/// Longest accepted job name
pub const MAX_JOB_NAME_LENGTH: usize = 255;

/// Discriminant identifying a job variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Foo,
    Bar,
}

impl JobType {
    pub const ALL: [JobType; 2] = [JobType::Foo, JobType::Bar];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Foo => "Foo",
            JobType::Bar => "Bar",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Foo" => Ok(JobType::Foo),
            "Bar" => Ok(JobType::Bar),
            _ => Err(format!("Invalid job type: {s}")),
        }
    }
}

/// Variant-specific data, tagged with its [`JobType`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobPayload {
    Foo { foo: i32 },
    Bar { bar: i32 },
}

impl JobPayload {
    /// Build the payload for `job_type` carrying `value` in its variant field
    pub fn new(job_type: JobType, value: i32) -> Self {
        match job_type {
            JobType::Foo => JobPayload::Foo { foo: value },
            JobType::Bar => JobPayload::Bar { bar: value },
        }
    }

    pub fn job_type(&self) -> JobType {
        match self {
            JobPayload::Foo { .. } => JobType::Foo,
            JobPayload::Bar { .. } => JobType::Bar,
        }
    }

    /// The variant field, whichever variant this is
    pub fn value(&self) -> i32 {
        match self {
            JobPayload::Foo { foo } => *foo,
            JobPayload::Bar { bar } => *bar,
        }
    }
}

/// A persisted job of any variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: JobPayload,
}

impl Job {
    pub fn job_type(&self) -> JobType {
        self.payload.job_type()
    }
}

/// Job to be inserted (id, status and timestamps are assigned by the store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub name: String,
    #[serde(flatten)]
    pub payload: JobPayload,
}

impl NewJob {
    pub fn new(name: impl Into<String>, payload: JobPayload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn foo(name: impl Into<String>, foo: i32) -> Self {
        Self::new(name, JobPayload::Foo { foo })
    }

    pub fn bar(name: impl Into<String>, bar: i32) -> Self {
        Self::new(name, JobPayload::Bar { bar })
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PolyjobError::ValidationError(
                "job name must not be empty".to_string(),
            ));
        }
        if self.name.len() > MAX_JOB_NAME_LENGTH {
            return Err(PolyjobError::ValidationError(format!(
                "job name exceeds {MAX_JOB_NAME_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Submission request as received from clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub name: String,
    pub value: i32,
    #[serde(rename = "type")]
    pub job_type: JobType,
}

impl From<JobRequest> for NewJob {
    fn from(request: JobRequest) -> Self {
        NewJob::new(request.name, JobPayload::new(request.job_type, request.value))
    }
}
