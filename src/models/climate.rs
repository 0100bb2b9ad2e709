//! Temperature sample model

use serde::{Deserialize, Serialize};

use crate::{Result, UrbanHeatError};

/// Representative temperatures for one location, in Celsius
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub average: f64,
    pub high: f64,
    pub low: f64,
}

impl ClimateSample {
    /// Create a sample, enforcing `low <= average <= high`
    pub fn new(average: f64, high: f64, low: f64) -> Result<Self> {
        if !(average.is_finite() && high.is_finite() && low.is_finite()) {
            return Err(UrbanHeatError::validation(
                "Climate sample values must be finite",
            ));
        }

        if low > average || average > high {
            return Err(UrbanHeatError::validation(format!(
                "Climate sample out of order: low {low:.1}, average {average:.1}, high {high:.1}"
            )));
        }

        Ok(Self { average, high, low })
    }
}
