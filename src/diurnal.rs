//! Daily high/low simulation around an average temperature

use crate::models::ClimateSample;
use crate::random::RandomSource;

const DIURNAL_MIN: f64 = 3.0;
const DIURNAL_MAX: f64 = 7.0;
/// Independent jitter on each side, `[0, SIDE_JITTER)`
const SIDE_JITTER: f64 = 3.0;
const HIGH_DIVISOR: f64 = 1.5;
const LOW_DIVISOR: f64 = 2.2;

/// Largest possible distance from the average to the simulated high
pub const MAX_HIGH_OFFSET: f64 = SIDE_JITTER + DIURNAL_MAX / HIGH_DIVISOR;
/// Largest possible distance from the average to the simulated low
pub const MAX_LOW_OFFSET: f64 = SIDE_JITTER + DIURNAL_MAX / LOW_DIVISOR;

/// Derive a high and low around `average`.
///
/// `low < average < high` holds for any physically plausible average; live
/// readings are range-checked before they get here.
pub fn simulate(average: f64, random: &dyn RandomSource) -> ClimateSample {
    let diurnal = random.uniform(DIURNAL_MIN, DIURNAL_MAX);
    let high_offset = random.uniform(0.0, SIDE_JITTER) + diurnal / HIGH_DIVISOR;
    let low_offset = random.uniform(0.0, SIDE_JITTER) + diurnal / LOW_DIVISOR;

    // Offsets are at least DIURNAL_MIN / divisor, so the ordering is strict
    ClimateSample {
        average,
        high: average + high_offset,
        low: average - low_offset,
    }
}
