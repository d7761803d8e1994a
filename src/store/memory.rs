//! # In-Memory Job Store
//!
//! A single collection of JSON documents, one per job, kept in insertion
//! order. Each store operation runs under the collection lock, so a single
//! conditional update is atomic the way it is in a document database. Nothing
//! is held across operations.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::{JobStore, StatusUpdate, StoreResult};
use crate::models::{Job, JobId, JobStatus, NewJob};

#[derive(Debug, Default)]
struct Collection {
    order: Vec<JobId>,
    documents: HashMap<JobId, Value>,
}

impl Collection {
    fn decode(&self, id: &JobId) -> StoreResult<Option<Job>> {
        match self.documents.get(id) {
            Some(doc) => Ok(Some(serde_json::from_value(doc.clone())?)),
            None => Ok(None),
        }
    }

    /// Compare-and-swap on the `status` field of one document
    fn swap_status(
        &mut self,
        id: &JobId,
        expected: JobStatus,
        new_status: JobStatus,
        updated_at: &Value,
    ) -> bool {
        let Some(doc) = self.documents.get_mut(id) else {
            return false;
        };
        if !has_status(doc, expected) {
            return false;
        }
        doc["status"] = Value::String(new_status.as_str().to_string());
        doc["updatedAt"] = updated_at.clone();
        true
    }
}

/// Decode a document for a multi-record read, logging and skipping bad ones
fn decode_or_skip(id: &JobId, doc: &Value) -> Option<Job> {
    match serde_json::from_value::<Job>(doc.clone()) {
        Ok(job) => Some(job),
        Err(e) => {
            error!(job_id = %id, "Skipping undecodable job document: {}", e);
            None
        }
    }
}

fn has_status(doc: &Value, status: JobStatus) -> bool {
    doc.get("status").and_then(Value::as_str) == Some(status.as_str())
}

/// Job store backed by process memory, for tests and single-process use
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    collection: RwLock<Collection>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.collection.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stored document for `id`, exactly as persisted
    pub fn raw_document(&self, id: JobId) -> Option<Value> {
        self.collection.read().documents.get(&id).cloned()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    #[instrument(skip(self, new_job), fields(name = %new_job.name))]
    async fn insert(&self, new_job: NewJob) -> StoreResult<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            name: new_job.name,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            payload: new_job.payload,
        };
        let doc = serde_json::to_value(&job)?;

        let mut collection = self.collection.write();
        collection.order.push(job.id);
        collection.documents.insert(job.id, doc);

        debug!(job_id = %job.id, job_type = %job.job_type(), "Inserted job document");
        Ok(job)
    }

    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<Job>> {
        self.collection.read().decode(&id)
    }

    async fn find_by_status(&self, status: JobStatus, limit: usize) -> StoreResult<Vec<Job>> {
        let collection = self.collection.read();
        let jobs = collection
            .order
            .iter()
            .filter_map(|id| collection.documents.get(id).map(|doc| (id, doc)))
            .filter(|(_, doc)| has_status(doc, status))
            .filter_map(|(id, doc)| decode_or_skip(id, doc))
            .take(limit)
            .collect::<Vec<Job>>();
        Ok(jobs)
    }

    async fn update_status_for_ids(
        &self,
        ids: &[JobId],
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<Vec<StatusUpdate>> {
        let now = Utc::now();
        let updated_at = serde_json::to_value(now)?;
        let mut collection = self.collection.write();
        let updated = ids
            .iter()
            .filter(|id| collection.swap_status(id, expected, new_status, &updated_at))
            .map(|id| StatusUpdate {
                id: *id,
                updated_at: now,
            })
            .collect::<Vec<_>>();
        Ok(updated)
    }

    async fn update_status_for_id(
        &self,
        id: JobId,
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<bool> {
        let updated_at = serde_json::to_value(Utc::now())?;
        Ok(self
            .collection
            .write()
            .swap_status(&id, expected, new_status, &updated_at))
    }

    async fn find_page(&self, offset: u64, limit: u64) -> StoreResult<Vec<Job>> {
        let collection = self.collection.read();
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let jobs = collection
            .order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| collection.documents.get(id).map(|doc| (id, doc)))
            .filter_map(|(id, doc)| decode_or_skip(id, doc))
            .collect::<Vec<Job>>();
        Ok(jobs)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.len() as u64)
    }
}
