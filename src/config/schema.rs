//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the dispatch engine and its simulation harness.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Worker pool settings.
    pub engine: EngineConfig,

    /// Rate meter tick and smoothing settings.
    pub metering: MeteringConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Load generation and generated backends.
    pub simulation: SimulationConfig,

    /// Explicit backend definitions. When non-empty these replace the
    /// generated `simulation.backend_count` backends.
    pub backends: Vec<BackendConfig>,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of concurrent worker loops.
    pub max_workers: usize,

    /// Interval between queue-length / rate report lines, in seconds.
    pub report_interval_secs: u64,
}

impl EngineConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: 64,
            report_interval_secs: 60,
        }
    }
}

/// Rate metering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MeteringConfig {
    /// Interval between meter ticks in seconds.
    pub tick_interval_secs: u64,

    /// EMA window in seconds. Must be at least one tick interval.
    pub window_secs: u64,
}

impl MeteringConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            window_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Load generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of generated backends when no explicit backends are given.
    pub backend_count: usize,

    /// Simulated processing time per request, in milliseconds.
    pub latency_ms: u64,

    /// Probability in `[0, 1]` that a simulated backend call fails.
    pub failure_rate: f64,

    /// Requests enqueued per second by the producer.
    pub requests_per_second: u64,

    /// How long the producer runs, in seconds.
    pub duration_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            backend_count: 10,
            latency_ms: 30,
            failure_rate: 0.0,
            requests_per_second: 1_000,
            duration_secs: 60,
        }
    }
}

/// Explicit backend definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub id: String,

    /// Routing key.
    pub key: String,

    /// Simulated processing time, in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Probability in `[0, 1]` that a call fails.
    #[serde(default)]
    pub failure_rate: f64,
}

fn default_latency_ms() -> u64 {
    30
}
