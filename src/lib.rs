//! `UrbanHeat` - Urban heat island analysis for cities
//!
//! This library resolves a city query to coordinates, estimates its
//! temperature profile and heat-island index, produces mitigation advice,
//! and records every analysis in a persistent query log.

pub mod advisory;
pub mod api;
pub mod catalog;
pub mod config;
pub mod diurnal;
pub mod error;
pub mod location_resolver;
pub mod models;
pub mod pipeline;
pub mod query_log;
pub mod random;
pub mod telemetry;
pub mod temperature;
pub mod uhi;
pub mod upstream;
pub mod web;

// Re-export core types for public API
pub use advisory::UhiTier;
pub use catalog::{PresetCatalog, PresetEntry};
pub use config::UrbanHeatConfig;
pub use error::UrbanHeatError;
pub use models::{ClimateSample, Location, LogRecord, UhiReport};
pub use pipeline::Analyzer;
pub use query_log::{FjallQueryLog, QueryLog};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, UrbanHeatError>;
