//! Property tests for the claim protocol

mod common;

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use common::{count_with_status, seed_mixed};
use polyjob_core::models::{JobId, JobStatus, NewJob};
use polyjob_core::orchestration::{JobClaimer, JobDispatcher};
use polyjob_core::registry::HandlerRegistry;
use polyjob_core::store::{InMemoryJobStore, JobStore};

fn multi_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("runtime")
}

/// Run `claimers` concurrent claimers for `rounds` rounds and collect every batch
async fn claim_concurrently(
    store: Arc<InMemoryJobStore>,
    claimers: usize,
    rounds: usize,
    limit: usize,
) -> Vec<Vec<JobId>> {
    let mut batches = Vec::new();
    for _ in 0..rounds {
        let handles: Vec<_> = (0..claimers)
            .map(|n| {
                let claimer = JobClaimer::new(store.clone(), format!("prop-{n}"));
                tokio::spawn(async move { claimer.claim_batch(limit).await.unwrap() })
            })
            .collect();
        for handle in handles {
            let batch = handle.await.unwrap();
            batches.push(batch.into_iter().map(|job| job.id).collect());
        }
    }
    batches
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// No job id is ever returned by two claims, and no batch exceeds its limit
    #[test]
    fn concurrent_claims_are_disjoint_and_bounded(
        jobs in 0usize..60,
        claimers in 1usize..6,
        rounds in 1usize..4,
        limit in 1usize..10,
    ) {
        let runtime = multi_thread_runtime();
        let (batches, pending, processing) = runtime.block_on(async {
            let store = InMemoryJobStore::arc();
            seed_mixed(store.as_ref(), jobs).await;
            let batches = claim_concurrently(store.clone(), claimers, rounds, limit).await;
            let pending = count_with_status(store.as_ref(), JobStatus::Pending).await;
            let processing = count_with_status(store.as_ref(), JobStatus::Processing).await;
            (batches, pending, processing)
        });

        let mut seen = HashSet::new();
        let mut claimed = 0;
        for batch in &batches {
            prop_assert!(batch.len() <= limit);
            for id in batch {
                prop_assert!(seen.insert(*id), "job {} claimed twice", id);
                claimed += 1;
            }
        }
        prop_assert_eq!(processing, claimed);
        prop_assert_eq!(pending + processing, jobs);
    }

    /// Claim then dispatch until empty: every job ends terminal exactly once
    #[test]
    fn draining_leaves_every_job_terminal(
        values in prop::collection::vec(any::<i32>(), 0..40),
        limit in 1usize..8,
    ) {
        let total = values.len();
        let (terminal, processed) = tokio_test::block_on(async {
            let store = InMemoryJobStore::arc();
            for (i, value) in values.iter().enumerate() {
                let new_job = if value % 2 == 0 {
                    NewJob::foo(format!("foo-{i}"), *value)
                } else {
                    NewJob::bar(format!("bar-{i}"), *value)
                };
                store.insert(new_job).await.unwrap();
            }
            let claimer = JobClaimer::new(store.clone(), "drain".to_string());
            let dispatcher = JobDispatcher::new(
                store.clone(),
                Arc::new(HandlerRegistry::with_default_handlers()),
            );

            let mut processed = 0;
            loop {
                let batch = claimer.claim_batch(limit).await.unwrap();
                if batch.is_empty() {
                    break;
                }
                processed += dispatcher.process_batch(batch).await.processed;
            }
            let terminal = count_with_status(store.as_ref(), JobStatus::Success).await
                + count_with_status(store.as_ref(), JobStatus::Failed).await;
            (terminal, processed)
        });

        prop_assert_eq!(processed, total);
        prop_assert_eq!(terminal, total);
    }
}
