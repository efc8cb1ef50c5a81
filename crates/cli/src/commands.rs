//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lockbench_core::Strategy;

use crate::config::BenchConfig;

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("lockbench")
        .about("Contention benchmark for counter decrement strategies")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .help("Config file (default: ./lockbench.toml if present)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log to stderr (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(build_run())
        .subcommand(build_compare())
        .subcommand(build_init_config())
}

fn build_run() -> Command {
    Command::new("run")
        .about("Run one strategy against its own counter")
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .short('s')
                .help("no-lock, pessimistic, optimistic or serializable")
                .required(true)
                .value_parser(Strategy::ALL.map(|s| s.id())),
        )
        .args(bench_args())
}

fn build_compare() -> Command {
    Command::new("compare")
        .about("Run all four strategies, each against its own counter")
        .args(bench_args())
}

fn build_init_config() -> Command {
    Command::new("init-config").about("Write a default lockbench.toml if missing")
}

/// Flags shared by `run` and `compare`; each overrides the config file.
fn bench_args() -> Vec<Arg> {
    vec![
        Arg::new("workers")
            .long("workers")
            .short('w')
            .help("Concurrent worker threads")
            .value_parser(value_parser!(usize)),
        Arg::new("requests")
            .long("requests")
            .short('n')
            .help("Total decrements per strategy")
            .value_parser(value_parser!(usize)),
        Arg::new("quantity")
            .long("quantity")
            .short('q')
            .help("Amount removed by each decrement")
            .value_parser(value_parser!(i64)),
        Arg::new("stock")
            .long("stock")
            .help("Stock each counter is reset to before the run")
            .value_parser(value_parser!(i64)),
        Arg::new("max-retries")
            .long("max-retries")
            .help("Optimistic attempts before giving up")
            .value_parser(value_parser!(usize)),
        Arg::new("latency-us")
            .long("latency-us")
            .help("Simulated store round-trip latency in microseconds")
            .value_parser(value_parser!(u64)),
        Arg::new("lock-timeout-ms")
            .long("lock-timeout-ms")
            .help("Row lock wait limit in milliseconds")
            .value_parser(value_parser!(u64)),
    ]
}

/// Apply command-line overrides on top of a loaded config.
pub fn apply_overrides(config: &mut BenchConfig, matches: &ArgMatches) {
    if let Some(&v) = matches.get_one::<usize>("workers") {
        config.workers = v;
    }
    if let Some(&v) = matches.get_one::<usize>("requests") {
        config.requests = v;
    }
    if let Some(&v) = matches.get_one::<i64>("quantity") {
        config.quantity = v;
    }
    if let Some(&v) = matches.get_one::<i64>("stock") {
        config.initial_stock = v;
    }
    if let Some(&v) = matches.get_one::<usize>("max-retries") {
        config.retry.max_retries = v;
    }
    if let Some(&v) = matches.get_one::<u64>("latency-us") {
        config.store.op_latency_us = v;
    }
    if let Some(&v) = matches.get_one::<u64>("lock-timeout-ms") {
        config.store.lock_timeout_ms = Some(v);
    }
}
