//! Data models for the urban heat analyzer
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates
//! - Climate: Average/high/low temperature samples
//! - Report: Analysis results and their persisted log records

pub mod climate;
pub mod location;
pub mod report;

// Re-export all public types for convenient access
pub use climate::ClimateSample;
pub use location::Location;
pub use report::{
    LocationSource, LogRecord, Provenance, TemperatureSource, UhiReport, UhiSource,
};
