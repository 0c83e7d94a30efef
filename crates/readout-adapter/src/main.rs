//! Readout adapter - Main entry point
//!
//! Hosts the readout controller on the bench register device and exposes
//! its key-path tree from the command line.

mod adapter;
mod bench;
mod config;
mod monitor;

use anyhow::Result;
use clap::{Parser, Subcommand};
use readout_control::ReadoutController;
use readout_core::reference_map;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::adapter::ReadoutAdapter;

#[derive(Parser, Debug)]
#[command(name = "readout")]
#[command(about = "Readout processor monitoring, recovery and UDP endpoint configuration")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "readout.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a value from the tree (empty path for the whole tree)
    Get {
        #[arg(default_value = "")]
        path: String,
    },
    /// Write a value; JSON is accepted, anything else is taken as a string
    Set { path: String, value: String },
    /// Reset the readout, then reactivate it
    Recover,
    /// Poll link health
    Monitor {
        /// Stop after this many polls
        #[arg(long)]
        polls: Option<usize>,
        /// Reset and reactivate when the link is down
        #[arg(long)]
        recover: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Readout adapter v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;

    let map = reference_map();
    let device = bench::bench_device(&map, &config.bench.presets)?;
    let controller = ReadoutController::new(&map, device, &config.registers)?;

    let mut adapter = ReadoutAdapter::new(controller);
    adapter.initialize(&["readout"]);

    match args.command {
        Command::Get { path } => {
            let value = adapter.get(&path)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Set { path, value } => {
            let value = serde_json::from_str(&value).unwrap_or_else(|_| Value::String(value));
            adapter.set(&path, &value)?;
        }
        Command::Recover => {
            adapter.set("status/reset", &Value::Null)?;
            adapter.set("status/reactivate", &Value::Null)?;
            let status = adapter.controller().link_status()?;
            println!(
                "is_running: {} (aurora lane {}, channel {}, cmac_0 {}, cmac_1 {})",
                status.is_healthy(),
                status.aurora_lane,
                status.aurora_channel,
                status.cmac_0,
                status.cmac_1
            );
        }
        Command::Monitor { polls, recover } => {
            let monitor_config = monitor::MonitorConfig {
                interval: Duration::from_millis(config.adapter.poll_interval_ms),
                polls,
                recover: recover || config.adapter.auto_recover,
            };
            let report = monitor::run(adapter.controller_mut(), &monitor_config);
            println!(
                "{} polls, {} healthy, {} recoveries",
                report.polls, report.healthy, report.recoveries
            );
        }
    }

    adapter.cleanup();
    Ok(())
}
