//! Concurrent load driver
//!
//! Spawns `workers` threads that start together on a barrier and pull request
//! slots from a shared counter until `requests` decrements have been issued.
//! A worker that sees the store go unavailable cancels the rest of the run.

use lockbench_concurrency::{CancellationToken, StrategyEngine};
use lockbench_core::error::ErrorKind;
use lockbench_core::{CounterId, Strategy, TransactionResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// One strategy's share of a benchmark
#[derive(Debug, Clone, Copy)]
pub struct RunPlan {
    pub strategy: Strategy,
    pub counter_id: CounterId,
    pub workers: usize,
    pub requests: usize,
    pub quantity: i64,
}

/// Everything a run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub results: Vec<TransactionResult>,
    pub wall: Duration,
}

/// Drive `plan.requests` decrements from `plan.workers` threads
pub fn run(engine: &StrategyEngine, plan: RunPlan, cancel: &CancellationToken) -> RunOutcome {
    let workers = plan.workers.max(1).min(plan.requests.max(1));
    let barrier = Arc::new(Barrier::new(workers));
    let issued = Arc::new(AtomicUsize::new(0));

    info!(
        strategy = %plan.strategy,
        counter_id = %plan.counter_id,
        workers,
        requests = plan.requests,
        "run started"
    );

    let start = Instant::now();
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let engine = engine.clone();
            let barrier = Arc::clone(&barrier);
            let issued = Arc::clone(&issued);
            let cancel = cancel.clone();
            thread::spawn(move || {
                let mut results = Vec::new();
                barrier.wait();
                while issued.fetch_add(1, Ordering::Relaxed) < plan.requests {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let result = engine.decrement_with_cancel(
                        plan.strategy,
                        plan.counter_id,
                        plan.quantity,
                        &cancel,
                    );
                    if result.error_kind == Some(ErrorKind::StoreUnavailable) {
                        warn!(error = ?result.error, "store unavailable, cancelling run");
                        cancel.cancel();
                    }
                    results.push(result);
                }
                results
            })
        })
        .collect();

    let mut results = Vec::with_capacity(plan.requests);
    for handle in handles {
        match handle.join() {
            Ok(worker_results) => results.extend(worker_results),
            Err(_) => warn!("worker thread panicked"),
        }
    }
    let wall = start.elapsed();

    info!(
        strategy = %plan.strategy,
        completed = results.len(),
        wall_ms = wall.as_millis() as u64,
        "run finished"
    );
    RunOutcome { results, wall }
}
