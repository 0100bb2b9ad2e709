//! Urban heat island index estimation
//!
//! The prediction service is asked first. If it does not answer in time, or
//! answers with something that is not a number, a local fallback is used: the
//! preset's reference score when the city is a preset, otherwise a heuristic
//! where hotter averages mean higher risk.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::{Location, UhiSource};
use crate::random::RandomSource;
use crate::upstream::{Lookup, UhiPredictor};

/// Average temperature at which the heuristic starts to rise
const HEURISTIC_BASELINE: f64 = 15.0;
/// Degrees above the baseline at which the temperature factor saturates
const HEURISTIC_SPAN: f64 = 20.0;
const HEURISTIC_WEIGHT: f64 = 70.0;
const HEURISTIC_NOISE: f64 = 25.0;
pub const HEURISTIC_MIN: f64 = 5.0;
pub const HEURISTIC_MAX: f64 = 98.0;

/// A UHI value and where it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UhiEstimate {
    pub value: f64,
    pub source: UhiSource,
}

/// Normalized temperature factor in `[0, 1]`
#[must_use]
pub fn temperature_factor(average: f64) -> f64 {
    ((average - HEURISTIC_BASELINE) / HEURISTIC_SPAN).clamp(0.0, 1.0)
}

/// Heuristic UHI in `[HEURISTIC_MIN, HEURISTIC_MAX]`
pub fn heuristic(average: f64, random: &dyn RandomSource) -> f64 {
    let noise = random.uniform(0.0, HEURISTIC_NOISE);
    (temperature_factor(average) * HEURISTIC_WEIGHT + noise).clamp(HEURISTIC_MIN, HEURISTIC_MAX)
}

/// Fold a prediction lookup with its fallback; the result is clamped to `[0, 100]`.
pub fn settle(
    predicted: Lookup<f64>,
    preset_reference: Option<f64>,
    heuristic: impl FnOnce() -> f64,
) -> UhiEstimate {
    let (value, source) = match predicted.finite() {
        Lookup::Found(value) => (value, UhiSource::Predicted),
        Lookup::Unavailable(reason) => {
            debug!("Using UHI fallback: {}", reason);
            match preset_reference {
                Some(reference) => (reference, UhiSource::PresetReference),
                None => (heuristic(), UhiSource::Heuristic),
            }
        }
    };

    UhiEstimate {
        value: value.clamp(0.0, 100.0),
        source,
    }
}

pub struct UhiEstimator {
    predictor: Arc<dyn UhiPredictor>,
    random: Arc<dyn RandomSource>,
    timeout: Duration,
}

impl UhiEstimator {
    pub fn new(
        predictor: Arc<dyn UhiPredictor>,
        random: Arc<dyn RandomSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            predictor,
            random,
            timeout,
        }
    }

    pub async fn estimate(
        &self,
        location: &Location,
        average: f64,
        preset_reference: Option<f64>,
    ) -> UhiEstimate {
        let predicted = match tokio::time::timeout(
            self.timeout,
            self.predictor.predict(location, average),
        )
        .await
        {
            Ok(lookup) => lookup,
            Err(_) => {
                warn!(
                    "Prediction service did not answer within {}ms",
                    self.timeout.as_millis()
                );
                Lookup::unavailable("timed out")
            }
        };

        settle(predicted, preset_reference, || {
            heuristic(average, self.random.as_ref())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, ThreadRandom};
    use async_trait::async_trait;
    use rstest::rstest;

    struct StubPredictor {
        answer: Lookup<f64>,
        delay: Duration,
    }

    #[async_trait]
    impl UhiPredictor for StubPredictor {
        async fn predict(&self, _location: &Location, _average_temp: f64) -> Lookup<f64> {
            tokio::time::sleep(self.delay).await;
            self.answer.clone()
        }
    }

    fn build_estimator(answer: Lookup<f64>, delay: Duration, fraction: f64) -> UhiEstimator {
        UhiEstimator::new(
            Arc::new(StubPredictor { answer, delay }),
            Arc::new(ScriptedRandom::constant(fraction)),
            Duration::from_millis(50),
        )
    }

    #[rstest]
    #[case(10.0, 0.0)]
    #[case(15.0, 0.0)]
    #[case(25.0, 0.5)]
    #[case(35.0, 1.0)]
    #[case(48.0, 1.0)]
    fn test_temperature_factor(#[case] average: f64, #[case] expected: f64) {
        assert!((temperature_factor(average) - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(0.0, 0.0, 5.0)]
    #[case(25.0, 0.0, 35.0)]
    #[case(25.0, 0.4, 45.0)]
    #[case(40.0, 0.99, 94.75)]
    fn test_heuristic_formula(#[case] average: f64, #[case] fraction: f64, #[case] expected: f64) {
        let value = heuristic(average, &ScriptedRandom::constant(fraction));
        assert!((value - expected).abs() < 1e-9, "{value} != {expected}");
    }

    #[test]
    fn test_heuristic_bounds() {
        let random = ThreadRandom;
        for average in [-20.0, 0.0, 15.0, 22.0, 30.0, 60.0] {
            for _ in 0..200 {
                let value = heuristic(average, &random);
                assert!((HEURISTIC_MIN..=HEURISTIC_MAX).contains(&value));
            }
        }
    }

    #[test]
    fn test_settle_prefers_prediction_and_clamps() {
        let estimate = settle(Lookup::Found(140.0), Some(22.0), || 50.0);
        assert_eq!(estimate.value, 100.0);
        assert_eq!(estimate.source, UhiSource::Predicted);

        let estimate = settle(Lookup::Found(-4.0), None, || 50.0);
        assert_eq!(estimate.value, 0.0);
    }

    #[test]
    fn test_settle_fallback_order() {
        let estimate = settle(Lookup::unavailable("down"), Some(22.0), || 50.0);
        assert_eq!(estimate, UhiEstimate { value: 22.0, source: UhiSource::PresetReference });

        let estimate = settle(Lookup::unavailable("down"), None, || 50.0);
        assert_eq!(estimate, UhiEstimate { value: 50.0, source: UhiSource::Heuristic });

        let estimate = settle(Lookup::Found(f64::NAN), None, || 61.0);
        assert_eq!(estimate.source, UhiSource::Heuristic);
    }

    #[tokio::test]
    async fn test_estimate_uses_prediction() {
        let estimator = build_estimator(Lookup::Found(63.5), Duration::ZERO, 0.0);
        let location = Location::new(13.08, 80.27).unwrap();

        let estimate = estimator.estimate(&location, 28.0, Some(65.0)).await;
        assert_eq!(estimate, UhiEstimate { value: 63.5, source: UhiSource::Predicted });
    }

    #[tokio::test]
    async fn test_estimate_times_out_to_heuristic() {
        let estimator = build_estimator(Lookup::Found(63.5), Duration::from_secs(5), 0.0);
        let location = Location::new(13.08, 80.27).unwrap();

        let estimate = estimator.estimate(&location, 25.0, None).await;
        assert_eq!(estimate, UhiEstimate { value: 35.0, source: UhiSource::Heuristic });
    }

    #[tokio::test]
    async fn test_estimate_unavailable_uses_preset_reference() {
        let estimator = build_estimator(Lookup::unavailable("refused"), Duration::ZERO, 0.9);
        let location = Location::new(25.5788, 91.8933).unwrap();

        let estimate = estimator.estimate(&location, 18.5, Some(22.0)).await;
        assert_eq!(estimate, UhiEstimate { value: 22.0, source: UhiSource::PresetReference });
    }
}
