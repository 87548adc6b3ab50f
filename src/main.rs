//! Request dispatch engine (simulation runner).
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                     DISPATCH ENGINE                       │
//!                 │                                                           │
//!   Producer      │  ┌──────────────┐     ┌──────────┐     ┌──────────────┐  │
//!   ──────────────┼─▶│ BlockingQueue│────▶│ worker × │────▶│   Selector   │  │
//!   (enqueue)     │  │  (FIFO)      │     │    N     │     │ (round robin)│  │
//!                 │  └──────────────┘     └────┬─────┘     └──────┬───────┘  │
//!                 │                            │                  │          │
//!                 │                            ▼                  ▼          │
//!                 │                     ┌─────────────┐    ┌─────────────┐   │
//!                 │                     │ReportRegistry│   │  Backend[i] │───┼──▶ process
//!                 │                     │ (EMA meters) │   └─────────────┘   │
//!                 │                     └─────────────┘                      │
//!                 │                                                           │
//!                 │  Background: meter driver (tick) · reporter (log/report)  │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use clap::Parser;

use dispatch_engine::config::{read_config, validate_config, ConfigError, DispatchConfig};
use dispatch_engine::lifecycle::signals::shutdown_signal;
use dispatch_engine::observability::{logging, metrics};
use dispatch_engine::simulation::{backends_from_config, Producer};
use dispatch_engine::{Backend, BlockingQueue, Engine, RoundRobin, Shutdown};

#[derive(Parser)]
#[command(name = "dispatch-engine")]
#[command(about = "Run the dispatch engine against simulated backends", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override engine.max_workers.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Override simulation.requests_per_second.
    #[arg(long)]
    rps: Option<u64>,

    /// Override simulation.duration_secs.
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Override simulation.backend_count.
    #[arg(long)]
    backends: Option<usize>,
}

impl Cli {
    fn apply(&self, config: &mut DispatchConfig) {
        if let Some(workers) = self.workers {
            config.engine.max_workers = workers;
        }
        if let Some(rps) = self.rps {
            config.simulation.requests_per_second = rps;
        }
        if let Some(duration) = self.duration_secs {
            config.simulation.duration_secs = duration;
        }
        if let Some(count) = self.backends {
            config.simulation.backend_count = count;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => DispatchConfig::default(),
    };
    // Overrides apply before validation so a flag can fix a bad file value.
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        max_workers = config.engine.max_workers,
        tick_interval_secs = config.metering.tick_interval_secs,
        window_secs = config.metering.window_secs,
        requests_per_second = config.simulation.requests_per_second,
        duration_secs = config.simulation.duration_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let simulated = backends_from_config(&config);
    let backends: Vec<Arc<dyn Backend>> = simulated
        .iter()
        .map(|b| b.clone() as Arc<dyn Backend>)
        .collect();

    let selector = Arc::new(RoundRobin::new(backends.len()));
    let engine = Engine::from_config(&config.engine, &config.metering, selector);
    let queue = Arc::new(BlockingQueue::new());

    engine.start(queue.clone(), backends)?;

    let shutdown = Shutdown::new();
    let producer = Producer::new(
        queue.clone(),
        config.simulation.requests_per_second,
        Duration::from_secs(config.simulation.duration_secs),
        shutdown.clone(),
    );
    let mut producer_task = tokio::spawn(producer.run());

    let finished = tokio::select! {
        result = &mut producer_task => Some(result?),
        _ = shutdown_signal() => None,
    };
    let enqueued = match finished {
        Some(enqueued) => enqueued,
        None => {
            shutdown.trigger();
            producer_task.await?
        }
    };

    tracing::info!(enqueued, queued = queue.len(), "Stopping engine");
    engine.stop().await?;

    let processed: u64 = simulated.iter().map(|b| b.processed()).sum();
    let failed: u64 = simulated.iter().map(|b| b.failed()).sum();
    tracing::info!(enqueued, processed, failed, remaining = queue.len(), "Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_before_validation() {
        let mut config = DispatchConfig::default();
        config.engine.max_workers = 0;
        assert!(validate_config(&config).is_err());

        let cli = Cli::parse_from(["dispatch-engine", "--workers", "4", "--rps", "50"]);
        cli.apply(&mut config);

        assert_eq!(config.engine.max_workers, 4);
        assert_eq!(config.simulation.requests_per_second, 50);
        assert!(validate_config(&config).is_ok());
    }
}
