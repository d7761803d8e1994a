//! Scheduler process: loads configuration, connects the PostgreSQL job store
//! and runs the claim/dispatch loop until Ctrl-C.

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use polyjob_core::config::ConfigManager;
use polyjob_core::logging::init_structured_logging;
use polyjob_core::orchestration::{JobClaimer, JobClaimerConfig, JobDispatcher, JobScheduler};
use polyjob_core::registry::HandlerRegistry;
use polyjob_core::store::{JobStore, PgJobStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let manager = ConfigManager::load().context("failed to load configuration")?;
    let config = manager.config();
    init_structured_logging(&config.logging);

    let pg_store = PgJobStore::connect(&config.database)
        .await
        .context("failed to connect to the job store")?;
    if config.database.run_migrations {
        pg_store.migrate().await.context("failed to run migrations")?;
    }
    let store: Arc<dyn JobStore> = Arc::new(pg_store);

    let claimer_id = format!("polyjob-{}-{}", std::process::id(), Uuid::new_v4());
    let claimer = Arc::new(JobClaimer::with_config(
        store.clone(),
        claimer_id.clone(),
        JobClaimerConfig::from(&config.scheduler),
    ));
    let dispatcher = Arc::new(
        JobDispatcher::new(store, Arc::new(HandlerRegistry::with_default_handlers()))
            .with_resolver(config.scheduler.outcome_policy.resolver())
            .with_mode(config.scheduler.dispatch_mode),
    );
    let scheduler = Arc::new(JobScheduler::new(
        claimer,
        dispatcher,
        config.scheduler.clone(),
    ));

    info!(
        claimer_id = %claimer_id,
        environment = manager.environment(),
        "Starting polyjob scheduler"
    );
    let handle = scheduler.start()?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested, waiting for in-flight ticks");
    scheduler.stop();
    handle.await.context("scheduler loop panicked")?;

    Ok(())
}
