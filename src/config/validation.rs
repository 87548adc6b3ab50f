//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (workers > 0, intervals > 0, probabilities in [0, 1])
//! - Check backend ids are unique
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatchConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::DispatchConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("metering.window_secs ({window}) must be at least metering.tick_interval_secs ({tick})")]
    WindowShorterThanTick { window: u64, tick: u64 },

    #[error("{field} must be within [0, 1], got {value}")]
    Probability { field: String, value: f64 },

    #[error("duplicate backend id '{0}'")]
    DuplicateBackend(String),

    #[error("no backends configured")]
    NoBackends,

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.engine.max_workers == 0 {
        errors.push(ValidationError::Zero { field: "engine.max_workers" });
    }
    if config.engine.report_interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "engine.report_interval_secs" });
    }
    if config.metering.tick_interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "metering.tick_interval_secs" });
    } else if config.metering.window_secs < config.metering.tick_interval_secs {
        errors.push(ValidationError::WindowShorterThanTick {
            window: config.metering.window_secs,
            tick: config.metering.tick_interval_secs,
        });
    }

    if !(0.0..=1.0).contains(&config.simulation.failure_rate) {
        errors.push(ValidationError::Probability {
            field: "simulation.failure_rate".to_string(),
            value: config.simulation.failure_rate,
        });
    }

    if config.backends.is_empty() {
        if config.simulation.backend_count == 0 {
            errors.push(ValidationError::NoBackends);
        }
    } else {
        let mut seen = HashSet::new();
        for backend in &config.backends {
            if !seen.insert(backend.id.as_str()) {
                errors.push(ValidationError::DuplicateBackend(backend.id.clone()));
            }
            if !(0.0..=1.0).contains(&backend.failure_rate) {
                errors.push(ValidationError::Probability {
                    field: format!("backends[{}].failure_rate", backend.id),
                    value: backend.failure_rate,
                });
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
