//! # Handler Registry
//!
//! Table mapping each [`JobType`] to the handler that processes it. Built once
//! at startup and shared read-only by every dispatcher.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::JobType;
use crate::orchestration::job_handler::{BarJobHandler, FooJobHandler, JobHandler};

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<JobType, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the logging handlers for every built-in variant
    pub fn with_default_handlers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FooJobHandler));
        registry.register(Arc::new(BarJobHandler));
        registry
    }

    /// Register a handler for its job type, returning the one it replaces
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) -> Option<Arc<dyn JobHandler>> {
        let job_type = handler.job_type();
        let previous = self.handlers.insert(job_type, handler);
        if previous.is_some() {
            warn!(job_type = %job_type, "Replaced existing job handler");
        } else {
            debug!(job_type = %job_type, "Registered job handler");
        }
        previous
    }

    pub fn get(&self, job_type: JobType) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&job_type).cloned()
    }

    pub fn contains(&self, job_type: JobType) -> bool {
        self.handlers.contains_key(&job_type)
    }

    /// Variants that have no handler and would always finalize as Failed
    pub fn missing_types(&self) -> Vec<JobType> {
        JobType::ALL
            .into_iter()
            .filter(|job_type| !self.contains(*job_type))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("job_types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::Job;
    use async_trait::async_trait;

    struct NoopFoo;

    #[async_trait]
    impl JobHandler for NoopFoo {
        fn job_type(&self) -> JobType {
            JobType::Foo
        }

        async fn process(&self, _job: &Job) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_registry_covers_all_variants() {
        let registry = HandlerRegistry::with_default_handlers();
        assert_eq!(registry.len(), JobType::ALL.len());
        assert!(registry.missing_types().is_empty());
    }

    #[test]
    fn test_register_replaces_handler_for_same_type() {
        let mut registry = HandlerRegistry::with_default_handlers();
        let previous = registry.register(Arc::new(NoopFoo));

        assert!(previous.is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_missing_types_reported() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(NoopFoo));
        assert_eq!(registry.missing_types(), vec![JobType::Bar]);
    }
}
