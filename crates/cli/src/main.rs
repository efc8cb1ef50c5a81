//! lockbench CLI: contention benchmark for counter decrement strategies.
//!
//! Three commands:
//! - **run**: `lockbench run --strategy optimistic` : one strategy, one counter
//! - **compare**: `lockbench compare` : all four strategies, counters 1–4
//! - **init-config**: `lockbench init-config` : write a default `lockbench.toml`

mod commands;
mod config;
mod harness;
mod report;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::ArgMatches;
use lockbench_concurrency::{CancellationToken, StrategyEngine};
use lockbench_core::{Counter, CounterId, CounterStore, Strategy};
use lockbench_storage::MemoryStore;
use tracing::Level;

use commands::{apply_overrides, build_cli};
use config::{BenchConfig, CONFIG_FILE_NAME};
use harness::RunPlan;
use report::{format_error, format_reports, OutputMode, RunReport};

fn main() {
    let matches = build_cli().get_matches();
    let Some((name, sub)) = matches.subcommand() else {
        process::exit(2);
    };

    let mode = if sub.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    init_tracing(sub.get_count("verbose"));

    let outcome = match name {
        "init-config" => init_config(sub),
        "run" => run_strategies(sub, None),
        "compare" => run_strategies(sub, Some(&Strategy::ALL[..])),
        other => Err(format!("unknown command '{}'", other)),
    };

    match outcome {
        Ok(output) => {
            if !output.is_empty() {
                print!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => return,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn config_path(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

fn init_config(matches: &ArgMatches) -> Result<String, String> {
    let path = config_path(matches);
    let created = BenchConfig::write_default_if_missing(&path).map_err(|e| e.to_string())?;
    Ok(if created {
        format!("Wrote {}\n", path.display())
    } else {
        format!("{} already exists\n", path.display())
    })
}

/// Config from `--config`, else `./lockbench.toml` if present, else defaults;
/// flags applied last.
fn load_config(matches: &ArgMatches) -> Result<BenchConfig, String> {
    let explicit = matches.get_one::<String>("config").is_some();
    let path = config_path(matches);
    let mut config = if explicit || Path::new(&path).exists() {
        BenchConfig::from_file(&path).map_err(|e| e.to_string())?
    } else {
        BenchConfig::default()
    };
    apply_overrides(&mut config, matches);
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Counter used by each strategy: 1 no-lock, 2 pessimistic, 3 optimistic, 4 serializable
fn counter_for(strategy: Strategy) -> CounterId {
    let idx = Strategy::ALL
        .iter()
        .position(|s| *s == strategy)
        .unwrap_or_default();
    CounterId(idx as u64 + 1)
}

fn run_strategies(matches: &ArgMatches, all: Option<&[Strategy]>) -> Result<String, String> {
    let config = load_config(matches)?;
    let strategies: Vec<Strategy> = match all {
        Some(all) => all.to_vec(),
        None => {
            let id = matches
                .get_one::<String>("strategy")
                .ok_or("--strategy is required")?;
            vec![id.parse::<Strategy>()?]
        }
    };

    let reports = bench(&config, &strategies).map_err(|e| e.to_string())?;
    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    Ok(format!("{}\n", format_reports(&reports, mode).trim_end()))
}

/// Seed counters 1–4, reset them to the baseline and run each strategy in turn
fn bench(
    config: &BenchConfig,
    strategies: &[Strategy],
) -> lockbench_core::Result<Vec<RunReport>> {
    let store = Arc::new(MemoryStore::with_config(config.store.clone()));
    let ids: Vec<CounterId> = Strategy::ALL.iter().map(|s| counter_for(*s)).collect();
    for id in &ids {
        store.insert(Counter::new(*id, format!("Product {}", id), config.initial_stock))?;
    }
    store.reset(&ids, config.initial_stock)?;

    let engine = StrategyEngine::new(store.clone()).with_retry_config(config.retry.clone());
    let cancel = CancellationToken::new();

    let mut reports = Vec::with_capacity(strategies.len());
    for &strategy in strategies {
        let counter_id = counter_for(strategy);
        let plan = RunPlan {
            strategy,
            counter_id,
            workers: config.workers,
            requests: config.requests,
            quantity: config.quantity,
        };
        let outcome = harness::run(&engine, plan, &cancel);
        let final_counter = store.read(counter_id)?;
        reports.push(RunReport::new(
            strategy,
            config.initial_stock,
            config.quantity,
            &outcome,
            &final_counter,
        ));
    }
    Ok(reports)
}
