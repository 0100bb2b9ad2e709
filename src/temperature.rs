//! Average temperature estimation
//!
//! Live readings come from a [`WeatherSource`]. When that is skipped or fails,
//! a latitude-driven baseline with bounded jitter stands in: warm near the
//! equator, cold toward the poles.

use std::sync::Arc;

use tracing::debug;

use crate::models::{Location, TemperatureSource};
use crate::random::RandomSource;
use crate::upstream::{Lookup, WeatherSource};

/// Baseline at the equator, in Celsius
const EQUATOR_BASELINE: f64 = 27.0;
/// Total drop from equator to pole
const POLAR_DROP: f64 = 32.0;
pub const BASELINE_MIN: f64 = -10.0;
pub const BASELINE_MAX: f64 = 35.0;
/// Jitter added on top of the baseline, `[-JITTER, JITTER)`
pub const JITTER: f64 = 3.0;

/// An average temperature and where it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub average: f64,
    pub source: TemperatureSource,
}

/// Latitude-only baseline, clamped to `[BASELINE_MIN, BASELINE_MAX]`
#[must_use]
pub fn latitude_baseline(latitude: f64) -> f64 {
    let lat_abs = latitude.abs().min(90.0);
    (EQUATOR_BASELINE - (lat_abs / 90.0) * POLAR_DROP).clamp(BASELINE_MIN, BASELINE_MAX)
}

/// Baseline plus jitter
pub fn synthesize(latitude: f64, random: &dyn RandomSource) -> f64 {
    latitude_baseline(latitude) + random.uniform(-JITTER, JITTER)
}

pub struct TemperatureEstimator {
    weather: Arc<dyn WeatherSource>,
    random: Arc<dyn RandomSource>,
}

impl TemperatureEstimator {
    pub fn new(weather: Arc<dyn WeatherSource>, random: Arc<dyn RandomSource>) -> Self {
        Self { weather, random }
    }

    /// Always yields a finite average
    pub async fn estimate(&self, location: &Location, offline: bool) -> TemperatureReading {
        let live = if offline {
            Lookup::unavailable("offline mode")
        } else {
            self.weather.current_temperature(location).await.finite()
        };

        match live {
            Lookup::Found(average) => TemperatureReading {
                average,
                source: TemperatureSource::Live,
            },
            Lookup::Unavailable(reason) => {
                let average = synthesize(location.latitude, self.random.as_ref());
                debug!(
                    "Synthesized average {:.1}°C from latitude {:.4} ({})",
                    average, location.latitude, reason
                );
                TemperatureReading {
                    average,
                    source: TemperatureSource::Synthesized,
                }
            }
        }
    }
}
