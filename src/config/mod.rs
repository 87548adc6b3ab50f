//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatchConfig (validated, immutable)
//!     → engine, metering, observability, simulation
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the engine's shape is fixed for a run
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, read_config, ConfigError};
pub use schema::{
    BackendConfig, DispatchConfig, EngineConfig, MeteringConfig, ObservabilityConfig,
    SimulationConfig,
};
pub use validation::{validate_config, ValidationError};
