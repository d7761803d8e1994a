//! # Job Scheduler
//!
//! Timer-driven loop: every `tick_interval` it claims a batch and dispatches
//! it. Each tick runs as its own task, so a slow tick does not delay the next
//! one and ticks may overlap. Overlapping ticks are safe because the claimer
//! never hands the same job to two callers; the loop adds no locking of its own.
//!
//! Stopping waits for in-flight ticks so their claimed jobs get finalized. A
//! process killed mid-tick leaves its claimed jobs in Processing; nothing
//! reclaims them.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SchedulerConfig;
use crate::error::{PolyjobError, Result};
use crate::orchestration::job_claimer::JobClaimer;
use crate::orchestration::job_dispatcher::{BatchReport, JobDispatcher};

/// Outcome of one claim + dispatch cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub claimed: usize,
    /// Set when the claim failed; the tick then processed nothing
    pub claim_error: Option<String>,
    pub batch: BatchReport,
}

pub struct JobScheduler {
    claimer: Arc<JobClaimer>,
    dispatcher: Arc<JobDispatcher>,
    config: SchedulerConfig,
    shutdown_notify: Arc<Notify>,
    running: AtomicBool,
    tick_counter: AtomicU64,
    completed_ticks: AtomicU64,
}

impl JobScheduler {
    pub fn new(
        claimer: Arc<JobClaimer>,
        dispatcher: Arc<JobDispatcher>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            claimer,
            dispatcher,
            config,
            shutdown_notify: Arc::new(Notify::new()),
            running: AtomicBool::new(false),
            tick_counter: AtomicU64::new(0),
            completed_ticks: AtomicU64::new(0),
        }
    }

    /// Claim one batch and process it
    ///
    /// Never fails: a claim error yields an empty tick, and per-job failures
    /// are contained in the batch report.
    #[instrument(skip(self), fields(claimer_id = %self.claimer.claimer_id()))]
    pub async fn run_tick(&self) -> TickReport {
        let tick = self.tick_counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(tick = tick, "Running jobs");

        let report = match self.claimer.claim_batch(self.config.batch_size).await {
            Ok(jobs) => {
                let claimed = jobs.len();
                let batch = self.dispatcher.process_batch(jobs).await;
                if batch.finalize_failures > 0 {
                    error!(
                        tick = tick,
                        finalize_failures = batch.finalize_failures,
                        "Some claimed jobs could not be finalized and remain processing"
                    );
                }
                TickReport {
                    tick,
                    claimed,
                    claim_error: None,
                    batch,
                }
            }
            Err(e) => {
                warn!(tick = tick, "Claim failed, skipping tick: {}", e);
                TickReport {
                    tick,
                    claim_error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        };

        self.completed_ticks.fetch_add(1, Ordering::Relaxed);
        if report.claimed > 0 {
            info!(
                tick = tick,
                claimed = report.claimed,
                succeeded = report.batch.succeeded,
                failed = report.batch.failed,
                "Tick complete"
            );
        }
        report
    }

    /// Spawn the timer loop
    ///
    /// Returns an error if the loop is already running. When the scheduler is
    /// disabled in configuration the returned task exits immediately.
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(PolyjobError::ValidationError(
                "scheduler is already running".to_string(),
            ));
        }

        if !self.config.enabled {
            info!("Scheduler disabled by configuration");
            self.running.store(false, Ordering::Release);
            return Ok(tokio::spawn(async {}));
        }

        let scheduler = Arc::clone(self);
        Ok(tokio::spawn(async move {
            scheduler.run_loop().await;
        }))
    }

    async fn run_loop(self: Arc<Self>) {
        let period = self.config.tick_interval();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: JoinSet<TickReport> = JoinSet::new();

        info!(
            tick_interval_ms = self.config.tick_interval_ms,
            batch_size = self.config.batch_size,
            "Scheduler loop started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown_notify.notified() => {
                    info!("Scheduler loop shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let scheduler = Arc::clone(&self);
                    in_flight.spawn(async move { scheduler.run_tick().await });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!("Tick task failed: {}", e);
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("Tick task failed during shutdown: {}", e);
            }
        }

        self.running.store(false, Ordering::Release);
        info!("Scheduler loop stopped");
    }

    /// Signal the loop to stop; in-flight ticks are awaited by the loop task
    ///
    /// A no-op when no loop is running, so it cannot cancel a later `start`.
    pub fn stop(&self) {
        if self.is_running() {
            self.shutdown_notify.notify_one();
        } else {
            debug!("Stop requested while scheduler is not running");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of ticks that have finished, successful or not
    pub fn completed_ticks(&self) -> u64 {
        self.completed_ticks.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobStatus, NewJob};
    use crate::registry::HandlerRegistry;
    use crate::store::{InMemoryJobStore, JobStore};
    use std::time::Duration;

    fn scheduler(store: Arc<InMemoryJobStore>, config: SchedulerConfig) -> Arc<JobScheduler> {
        let claimer = Arc::new(JobClaimer::new(store.clone(), "scheduler-test".to_string()));
        let dispatcher = Arc::new(JobDispatcher::new(
            store,
            Arc::new(HandlerRegistry::with_default_handlers()),
        ));
        Arc::new(JobScheduler::new(claimer, dispatcher, config))
    }

    #[tokio::test]
    async fn test_tick_on_empty_store() {
        let store = InMemoryJobStore::arc();
        let scheduler = scheduler(store, SchedulerConfig::default());

        let report = scheduler.run_tick().await;

        assert_eq!(report.tick, 1);
        assert_eq!(report.claimed, 0);
        assert!(report.claim_error.is_none());
        assert_eq!(scheduler.completed_ticks(), 1);
    }

    #[tokio::test]
    async fn test_tick_finalizes_claimed_batch() {
        let store = InMemoryJobStore::arc();
        for i in 0..7 {
            store.insert(NewJob::bar(format!("job-{i}"), i)).await.unwrap();
        }
        let scheduler = scheduler(store.clone(), SchedulerConfig::default());

        let report = scheduler.run_tick().await;

        assert_eq!(report.claimed, 5);
        assert_eq!(report.batch.succeeded, 5);
        let pending = store.find_by_status(JobStatus::Pending, 10).await.unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn test_stop_before_start_does_not_cancel_next_loop() {
        let store = InMemoryJobStore::arc();
        store.insert(NewJob::foo("after-idle-stop", 1)).await.unwrap();
        let config = SchedulerConfig {
            tick_interval_ms: 10,
            ..Default::default()
        };
        let scheduler = scheduler(store.clone(), config);

        scheduler.stop();
        let handle = scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(scheduler.is_running());
        assert!(!handle.is_finished());
        assert!(scheduler.completed_ticks() >= 1);
        let pending = store.find_by_status(JobStatus::Pending, 10).await.unwrap();
        assert!(pending.is_empty());

        scheduler.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler loop did not stop")
            .unwrap();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected_and_stop_ends_loop() {
        let store = InMemoryJobStore::arc();
        let config = SchedulerConfig {
            tick_interval_ms: 10,
            ..Default::default()
        };
        let scheduler = scheduler(store, config);

        let handle = scheduler.start().unwrap();
        assert!(scheduler.start().is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler loop did not stop")
            .unwrap();

        assert!(!scheduler.is_running());
        assert!(scheduler.completed_ticks() >= 1);
    }

    #[tokio::test]
    async fn test_disabled_scheduler_does_not_tick() {
        let store = InMemoryJobStore::arc();
        let config = SchedulerConfig {
            enabled: false,
            ..Default::default()
        };
        let scheduler = scheduler(store, config);

        scheduler.start().unwrap().await.unwrap();
        assert_eq!(scheduler.completed_ticks(), 0);
        assert!(!scheduler.is_running());
    }
}
