//! Strategy Properties
//!
//! End-to-end checks through the public `lockbench` facade:
//! - Safety: strategies that prevent lost updates land on S - N under load
//! - Unsafety: no-lock never undershoots S - N
//! - Isolation: concurrent runs on different counters do not interfere
//! - Reset: the administrative reset restores the baseline between runs
//! - Read idempotence

use lockbench::{
    CancellationToken, Counter, CounterId, CounterStore, ErrorKind, MemoryStore, RetryConfig,
    StoreConfig, Strategy, StrategyEngine, TransactionResult,
};
use proptest::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;

// ============================================================================
// Helpers
// ============================================================================

fn seeded(stock: i64, latency_us: u64) -> Arc<MemoryStore> {
    let store = MemoryStore::with_config(StoreConfig::new().with_op_latency_us(latency_us));
    for id in 1..=4u64 {
        store
            .insert(Counter::new(CounterId(id), format!("Product {}", id), stock))
            .unwrap();
    }
    Arc::new(store)
}

fn hammer(
    engine: &StrategyEngine,
    strategy: Strategy,
    id: CounterId,
    workers: usize,
    per_worker: usize,
    quantity: i64,
) -> Vec<TransactionResult> {
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let engine = engine.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..per_worker)
                    .map(|_| engine.decrement(strategy, id, quantity))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

// ============================================================================
// Safety
// ============================================================================

#[test]
fn safe_strategies_account_for_every_success() {
    let store = seeded(1000, 100);
    let engine = StrategyEngine::new(store.clone())
        .with_retry_config(RetryConfig::new().with_max_retries(64));

    for strategy in Strategy::ALL.into_iter().filter(|s| s.prevents_lost_updates()) {
        let id = CounterId(Strategy::ALL.iter().position(|s| *s == strategy).unwrap() as u64 + 1);
        let results = hammer(&engine, strategy, id, 8, 5, 2);
        let successes = results.iter().filter(|r| r.success).count() as i64;

        let row = store.read(id).unwrap();
        assert_eq!(row.stock, 1000 - 2 * successes, "{}", strategy);
        assert_eq!(row.version, successes as u64, "{}", strategy);

        match strategy {
            Strategy::Pessimistic | Strategy::Optimistic => assert_eq!(successes, 40),
            Strategy::Serializable => assert!(results
                .iter()
                .filter(|r| !r.success)
                .all(|r| r.error_kind == Some(ErrorKind::IsolationFailure))),
            Strategy::NoLock => unreachable!(),
        }
    }
}

#[test]
fn no_lock_never_undershoots() {
    let store = seeded(1000, 300);
    let engine = StrategyEngine::new(store.clone());

    let results = hammer(&engine, Strategy::NoLock, CounterId(1), 10, 10, 1);
    assert_eq!(results.len(), 100);
    assert!(results.iter().all(|r| r.success));
    assert!(store.read(CounterId(1)).unwrap().stock >= 900);
}

// ============================================================================
// Isolation between counters
// ============================================================================

#[test]
fn parallel_strategies_touch_only_their_counter() {
    let store = seeded(500, 50);
    let engine = StrategyEngine::new(store.clone())
        .with_retry_config(RetryConfig::new().with_max_retries(64));

    let handles: Vec<_> = Strategy::ALL
        .into_iter()
        .enumerate()
        .map(|(i, strategy)| {
            let engine = engine.clone();
            thread::spawn(move || {
                let id = CounterId(i as u64 + 1);
                (id, hammer(&engine, strategy, id, 4, 5, 1))
            })
        })
        .collect();

    for handle in handles {
        let (id, results) = handle.join().unwrap();
        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.counter_id == id));
        let row = store.read(id).unwrap();
        assert!(row.stock >= 480 && row.stock < 500, "counter {} = {}", id, row.stock);
    }
}

// ============================================================================
// Reset and reads
// ============================================================================

#[test]
fn reset_restores_baseline_between_runs() {
    let store = seeded(1000, 0);
    let engine = StrategyEngine::new(store.clone());
    let ids: Vec<CounterId> = (1..=4).map(CounterId).collect();

    for strategy in Strategy::ALL {
        hammer(&engine, strategy, CounterId(2), 2, 5, 3);
    }
    assert_ne!(store.read(CounterId(2)).unwrap().version, 0);

    store.reset(&ids, 1000).unwrap();
    for counter in store.snapshot() {
        assert_eq!((counter.stock, counter.version), (1000, 0));
    }
}

#[test]
fn cancelled_engine_call_is_a_no_op() {
    let store = seeded(7, 0);
    let engine = StrategyEngine::new(store.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let r = engine.decrement_with_cancel(Strategy::Serializable, CounterId(4), 1, &cancel);
    assert_eq!(r.error.as_deref(), Some("Operation cancelled"));
    assert_eq!(store.read(CounterId(4)).unwrap().stock, 7);
}

proptest! {
    #[test]
    fn prop_reads_are_idempotent(stock in -1000i64..1000, reads in 1usize..10) {
        let store = seeded(stock, 0);
        let first = store.read(CounterId(3)).unwrap();
        for _ in 0..reads {
            prop_assert_eq!(&store.read(CounterId(3)).unwrap(), &first);
        }
    }

    #[test]
    fn prop_sequential_decrements_sum_up(
        quantities in prop::collection::vec(1i64..50, 1..20),
        strategy_idx in 0usize..4,
    ) {
        let strategy = Strategy::ALL[strategy_idx];
        let store = seeded(100, 0);
        let engine = StrategyEngine::new(store.clone());

        for q in &quantities {
            let before = store.read(CounterId(1)).unwrap().stock;
            let r = engine.decrement(strategy, CounterId(1), *q);
            prop_assert!(r.success);
            prop_assert_eq!(r.old_stock, before);
            prop_assert_eq!(r.new_stock, before - q);
        }

        let total: i64 = quantities.iter().sum();
        let row = store.read(CounterId(1)).unwrap();
        prop_assert_eq!(row.stock, 100 - total);
        prop_assert_eq!(row.version, quantities.len() as u64);
    }
}
