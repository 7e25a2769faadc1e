// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fieldnet Collector
//!
//! UDP telemetry collector for simulated field devices: handshakes, loss
//! and duplicate detection, checksum validation, heartbeat timeouts, and
//! running integrity metrics.
//!
//! # Usage
//!
//! ```bash
//! # Start on the default port (9999)
//! fieldnet-collector
//!
//! # Custom port and config
//! fieldnet-collector --port 9910 --config collector.json
//!
//! # Push metrics snapshots to a monitoring consumer
//! fieldnet-collector --push-metrics 127.0.0.1:9901
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod server;
mod sink;

pub use config::CollectorConfig;
pub use server::Collector;

/// Fieldnet Collector - UDP telemetry ingestion for field sensor fleets
#[derive(Parser, Debug)]
#[command(name = "fieldnet-collector")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// UDP port to listen on
    #[arg(short, long, default_value = "9999")]
    port: u16,

    /// Bind address (0.0.0.0 for all interfaces)
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Configuration file (JSON format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Readings log path (CSV, truncated at startup)
    #[arg(long, default_value = "sensor-readings.csv")]
    readings: PathBuf,

    /// Metrics file path (rewritten per update)
    #[arg(long, default_value = "metrics.csv")]
    metrics: PathBuf,

    /// Push metrics snapshots to this UDP endpoint
    #[arg(long)]
    push_metrics: Option<SocketAddr>,

    /// Heartbeat timeout in seconds
    #[arg(long, default_value = "20")]
    heartbeat_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.as_str() {
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

    // Load or create config
    let config = if let Some(config_path) = args.config {
        info!("Loading config from {:?}", config_path);
        CollectorConfig::from_file(&config_path)?
    } else {
        CollectorConfig {
            bind_address: args.bind.parse()?,
            port: args.port,
            readings_path: args.readings,
            metrics_path: args.metrics,
            metrics_push_addr: args.push_metrics,
            heartbeat_timeout_secs: args.heartbeat_timeout,
            ..Default::default()
        }
    };

    info!("+----------------------------------------------------+");
    info!(
        "|       Fieldnet Collector v{}                    |",
        env!("CARGO_PKG_VERSION")
    );
    info!("+----------------------------------------------------+");
    info!("|  Bind:     {:38} |", format!("{}:{}", config.bind_address, config.port));
    info!("|  Readings: {:38} |", config.readings_path.display());
    info!("|  Metrics:  {:38} |", config.metrics_path.display());
    info!(
        "|  Push:     {:38} |",
        config
            .metrics_push_addr
            .map(|a| a.to_string())
            .unwrap_or_else(|| "disabled".to_string())
    );
    info!(
        "|  Timeout:  {:38} |",
        format!("{}s", config.heartbeat_timeout_secs)
    );
    info!("+----------------------------------------------------+");

    // The receive loop blocks without timeout; termination is external.
    ctrlc::set_handler(|| {
        eprintln!("shutdown signal received, stopping collector");
        std::process::exit(0);
    })?;

    let mut collector = Collector::new(&config)?;
    collector.run()
}
