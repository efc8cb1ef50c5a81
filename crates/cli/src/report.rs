//! Run summaries → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): aligned key/value block per strategy
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use crate::harness::RunOutcome;
use lockbench_core::{Counter, CounterId, Strategy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Latency distribution of one run, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

impl LatencyStats {
    /// Nearest-rank percentiles over per-request elapsed times
    pub fn from_durations(durations: &[Duration]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }
        let mut ms: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        ms.sort_by(|a, b| a.total_cmp(b));

        let rank = |p: f64| {
            let idx = ((p / 100.0) * ms.len() as f64).ceil() as usize;
            ms[idx.clamp(1, ms.len()) - 1]
        };
        Self {
            avg_ms: ms.iter().sum::<f64>() / ms.len() as f64,
            p50_ms: rank(50.0),
            p95_ms: rank(95.0),
            p99_ms: rank(99.0),
            max_ms: ms[ms.len() - 1],
        }
    }
}

/// Summary of one strategy's run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub strategy: Strategy,
    pub counter_id: CounterId,
    pub requests: usize,
    pub successes: usize,
    pub failures: usize,
    pub total_retries: usize,
    /// Failure counts keyed by error kind
    pub errors: BTreeMap<String, usize>,
    pub latency: LatencyStats,
    pub wall_ms: f64,
    pub throughput_rps: f64,
    pub initial_stock: i64,
    pub expected_stock: i64,
    pub final_stock: i64,
    pub final_version: u64,
    /// Successful decrements whose effect is missing from the final stock
    pub lost_updates: i64,
}

impl RunReport {
    /// Summarize `outcome` against the counter's state after the run
    pub fn new(
        strategy: Strategy,
        initial_stock: i64,
        quantity: i64,
        outcome: &RunOutcome,
        final_counter: &Counter,
    ) -> Self {
        let results = &outcome.results;
        let successes = results.iter().filter(|r| r.success).count();

        let mut errors = BTreeMap::new();
        for kind in results.iter().filter_map(|r| r.error_kind) {
            *errors.entry(kind.to_string()).or_insert(0) += 1;
        }

        let durations: Vec<Duration> = results.iter().map(|r| r.elapsed).collect();
        let wall_secs = outcome.wall.as_secs_f64();
        let expected_stock = initial_stock.saturating_sub(quantity.saturating_mul(successes as i64));

        Self {
            strategy,
            counter_id: final_counter.id,
            requests: results.len(),
            successes,
            failures: results.len() - successes,
            total_retries: results.iter().map(|r| r.retries).sum(),
            errors,
            latency: LatencyStats::from_durations(&durations),
            wall_ms: wall_secs * 1000.0,
            throughput_rps: if wall_secs > 0.0 {
                results.len() as f64 / wall_secs
            } else {
                0.0
            },
            initial_stock,
            expected_stock,
            final_stock: final_counter.stock,
            final_version: final_counter.version,
            lost_updates: (final_counter.stock - expected_stock) / quantity.max(1),
        }
    }
}

/// Format a list of reports.
pub fn format_reports(reports: &[RunReport], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(reports)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        OutputMode::Human => {
            let mut out = String::new();
            for report in reports {
                out.push_str(&format_human(report));
            }
            if reports.len() > 1 {
                out.push_str(&format_final_stock(reports));
            }
            out
        }
    }
}

/// Format an error.
pub fn format_error(err: &str, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(&serde_json::json!({ "error": err }))
            .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", err)),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn format_human(r: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] counter {}", r.strategy, r.counter_id);
    let _ = writeln!(
        out,
        "  requests     {} ({} ok, {} failed)",
        r.requests, r.successes, r.failures
    );
    if !r.errors.is_empty() {
        let errors: Vec<String> = r.errors.iter().map(|(k, n)| format!("{}={}", k, n)).collect();
        let _ = writeln!(out, "  errors       {}", errors.join(", "));
    }
    let _ = writeln!(out, "  retries      {}", r.total_retries);
    let _ = writeln!(
        out,
        "  latency ms   avg {:.2}  p50 {:.2}  p95 {:.2}  p99 {:.2}  max {:.2}",
        r.latency.avg_ms, r.latency.p50_ms, r.latency.p95_ms, r.latency.p99_ms, r.latency.max_ms
    );
    let _ = writeln!(
        out,
        "  throughput   {:.1} req/s over {:.1} ms",
        r.throughput_rps, r.wall_ms
    );
    let _ = writeln!(
        out,
        "  stock        {} -> {} (expected {}, version {})",
        r.initial_stock, r.final_stock, r.expected_stock, r.final_version
    );
    if r.lost_updates != 0 {
        let _ = writeln!(out, "  lost updates {}", r.lost_updates);
    }
    out.push('\n');
    out
}

fn format_final_stock(reports: &[RunReport]) -> String {
    let mut out = String::from("========== Final Stock Results ==========\n");
    for r in reports {
        let _ = writeln!(
            out,
            "[{}] Counter {}: stock={}, version={}",
            r.strategy, r.counter_id, r.final_stock, r.final_version
        );
    }
    out.push_str("==========================================\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbench_core::error::Error;
    use lockbench_core::TransactionResult;

    fn ok(ms: u64, retries: usize) -> TransactionResult {
        TransactionResult::succeeded(
            Strategy::Optimistic,
            CounterId(3),
            10,
            9,
            retries,
            Duration::from_millis(ms),
        )
    }

    #[test]
    fn percentiles_use_nearest_rank() {
        let durations: Vec<Duration> = (1..=100).map(Duration::from_millis).collect();
        let stats = LatencyStats::from_durations(&durations);
        assert_eq!(stats.p50_ms, 50.0);
        assert_eq!(stats.p95_ms, 95.0);
        assert_eq!(stats.p99_ms, 99.0);
        assert_eq!(stats.max_ms, 100.0);
        assert!((stats.avg_ms - 50.5).abs() < 1e-9);
        assert_eq!(LatencyStats::from_durations(&[]), LatencyStats::default());
    }

    #[test]
    fn report_counts_outcomes_and_lost_updates() {
        let failed = TransactionResult::failed(
            Strategy::Optimistic,
            CounterId(3),
            10,
            9,
            5,
            Duration::from_millis(4),
            &Error::MaxRetriesExceeded { retries: 5 },
        );
        let outcome = RunOutcome {
            results: vec![ok(1, 0), ok(2, 2), ok(3, 1), failed],
            wall: Duration::from_millis(10),
        };
        let mut counter = Counter::new(CounterId(3), "Product 3", 1000);
        counter.stock = 998;
        counter.version = 2;

        let report = RunReport::new(Strategy::Optimistic, 1000, 1, &outcome, &counter);
        assert_eq!(report.successes, 3);
        assert_eq!(report.failures, 1);
        assert_eq!(report.total_retries, 8);
        assert_eq!(report.errors.get("max_retries_exceeded"), Some(&1));
        assert_eq!(report.expected_stock, 997);
        assert_eq!(report.lost_updates, 1);
        assert!((report.throughput_rps - 400.0).abs() < 1e-6);
    }

    #[test]
    fn json_and_human_output() {
        let outcome = RunOutcome {
            results: vec![ok(1, 0)],
            wall: Duration::from_millis(1),
        };
        let mut counter = Counter::new(CounterId(3), "Product 3", 10);
        counter.stock = 9;
        counter.version = 1;
        let reports = vec![RunReport::new(Strategy::Optimistic, 10, 1, &outcome, &counter)];

        let json: serde_json::Value =
            serde_json::from_str(&format_reports(&reports, OutputMode::Json)).unwrap();
        assert_eq!(json[0]["strategy"], "optimistic");
        assert_eq!(json[0]["final_stock"], 9);
        assert_eq!(json[0]["lost_updates"], 0);

        let human = format_reports(&reports, OutputMode::Human);
        assert!(human.contains("[optimistic] counter 3"));
        assert!(human.contains("10 -> 9"));
        assert!(!human.contains("lost updates"));

        assert_eq!(format_error("boom", OutputMode::Human), "(error) boom");
    }
}
