//! Analysis report and persisted log record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClimateSample, Location};
use crate::advisory::UhiTier;

/// Where the coordinates of a report came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Preset,
    Geocoded,
    Fallback,
}

/// Where the average temperature of a report came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureSource {
    Preset,
    Live,
    Synthesized,
}

/// Where the heat-island index of a report came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UhiSource {
    Predicted,
    PresetReference,
    Heuristic,
}

/// Provenance of each stage of the pipeline
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    pub location: LocationSource,
    pub temperature: TemperatureSource,
    pub uhi: UhiSource,
}

/// Result of one city analysis
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UhiReport {
    /// The query exactly as the caller typed it
    pub city: String,
    pub location: Location,
    pub sample: ClimateSample,
    /// Heat-island index in `[0, 100]`
    pub uhi: f64,
    pub tier: UhiTier,
    /// Ordered advisory lines, plain text
    pub advisory: Vec<String>,
    pub note: String,
    pub source_label: String,
    pub provenance: Provenance,
}

/// Persisted snapshot of one analysis
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LogRecord {
    pub id: u64,
    pub query: String,
    pub report: UhiReport,
    pub created_at: DateTime<Utc>,
}
