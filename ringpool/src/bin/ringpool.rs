//! Command-line runner for ring election scenarios.
//!
//! # Usage
//!
//! ```bash
//! ringpool scenario.txt
//! ringpool scenario.txt --trace run.log --max-rounds 500 --json
//! RUST_LOG=ringpool=debug ringpool scenario.txt --round-period-ms 20
//! ```
//!
//! The protocol trace goes to `--trace` (default `log.txt`), the report to
//! stdout and diagnostics to stderr.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use ringpool::{NetworkConfig, RingNetwork, RunReport, Scenario, WriterTrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "ringpool")]
#[command(about = "Simulate Chang-Roberts leader election on a ring with failures", long_about = None)]
struct Args {
    /// Scenario script
    script: PathBuf,

    /// Where to write the protocol trace
    #[arg(long, default_value = "log.txt")]
    trace: PathBuf,

    /// Abort if the run has not completed after this many rounds
    #[arg(long)]
    max_rounds: Option<u64>,

    /// Sleep this long at the end of every round
    #[arg(long)]
    round_period_ms: Option<u64>,

    /// JSON network configuration; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&args) {
        Ok(report) => {
            if args.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("ERROR: unable to encode report: {e}");
                        process::exit(1);
                    }
                }
            } else {
                println!("{report}");
            }
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<RunReport, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => NetworkConfig::from_json_file(path)?,
        None => NetworkConfig::default(),
    };
    if let Some(limit) = args.max_rounds {
        config = config.with_max_rounds(limit);
    }
    if let Some(period) = args.round_period_ms {
        config.round_period = Duration::from_millis(period);
    }

    let scenario = Scenario::from_file(&args.script)?;
    tracing::info!(
        script = %args.script.display(),
        nodes = scenario.nodes().len(),
        trace = %args.trace.display(),
        "starting run"
    );

    let trace = WriterTrace::create(&args.trace)?;
    let mut network = RingNetwork::new(&scenario, config, trace);
    Ok(network.run_blocking()?)
}
