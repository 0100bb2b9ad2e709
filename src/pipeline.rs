//! City climate analysis pipeline
//!
//! Resolver → temperature → diurnal range → UHI → advisory → query log.
//! Each stage absorbs upstream failures with its own fallback, so the only
//! error `analyze` returns is a rejected query.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result as AnyResult;
use tracing::{info, instrument, warn};

use crate::advisory::{UhiTier, build_advice};
use crate::catalog::PresetCatalog;
use crate::config::UrbanHeatConfig;
use crate::diurnal;
use crate::location_resolver::LocationResolver;
use crate::models::{Location, Provenance, TemperatureSource, UhiReport};
use crate::query_log::QueryLog;
use crate::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::temperature::TemperatureEstimator;
use crate::uhi::UhiEstimator;
use crate::upstream::{
    Geocoder, HttpUhiPredictor, NominatimGeocoder, OpenMeteoWeather, UhiPredictor, WeatherSource,
};
use crate::{Result, UrbanHeatError};

const LIVE_NOTE: &str = "Live geocode + weather; UHI by ML service";

/// External services and sinks the pipeline talks to
pub struct Collaborators {
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherSource>,
    pub predictor: Arc<dyn UhiPredictor>,
    pub random: Arc<dyn RandomSource>,
    pub log: Arc<dyn QueryLog>,
}

/// Fixed pipeline parameters
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerSettings {
    pub default_location: Location,
    pub predictor_timeout: Duration,
}

pub struct Analyzer {
    catalog: Arc<PresetCatalog>,
    resolver: LocationResolver,
    temperature: TemperatureEstimator,
    uhi: UhiEstimator,
    random: Arc<dyn RandomSource>,
    log: Arc<dyn QueryLog>,
}

/// Client-facing data label; keyed on the offline flag alone. The actual
/// origin of each value is reported through [`Provenance`].
fn source_label(offline: bool) -> &'static str {
    if offline {
        "Simulated (offline)"
    } else {
        "Current-based"
    }
}

impl Analyzer {
    pub fn new(
        catalog: Arc<PresetCatalog>,
        collaborators: Collaborators,
        settings: AnalyzerSettings,
    ) -> Self {
        let Collaborators {
            geocoder,
            weather,
            predictor,
            random,
            log,
        } = collaborators;

        Self {
            resolver: LocationResolver::new(catalog.clone(), geocoder, settings.default_location),
            temperature: TemperatureEstimator::new(weather, random.clone()),
            uhi: UhiEstimator::new(predictor, random.clone(), settings.predictor_timeout),
            catalog,
            random,
            log,
        }
    }

    /// Wire the HTTP clients described by `config` around the given log
    pub fn from_config(config: &UrbanHeatConfig, log: Arc<dyn QueryLog>) -> AnyResult<Self> {
        let random: Arc<dyn RandomSource> = match config.analysis.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };

        let collaborators = Collaborators {
            geocoder: Arc::new(NominatimGeocoder::new(&config.services)?),
            weather: Arc::new(OpenMeteoWeather::new(&config.services)?),
            predictor: Arc::new(HttpUhiPredictor::new(&config.services)?),
            random,
            log,
        };

        let settings = AnalyzerSettings {
            default_location: Location::new(
                config.analysis.default_latitude,
                config.analysis.default_longitude,
            )?,
            predictor_timeout: config.services.predictor_timeout(),
        };

        Ok(Self::new(
            Arc::new(PresetCatalog::builtin()),
            collaborators,
            settings,
        ))
    }

    #[must_use]
    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn query_log(&self) -> &Arc<dyn QueryLog> {
        &self.log
    }

    /// Analyze one city query.
    ///
    /// Preset names must match exactly; whitespace-only queries are rejected
    /// before anything runs.
    #[instrument(skip(self))]
    pub async fn analyze(&self, query: &str, offline: bool) -> Result<UhiReport> {
        if query.trim().is_empty() {
            return Err(UrbanHeatError::validation("query string required"));
        }
        let start_time = Instant::now();

        let resolution = self.resolver.resolve(query).await;
        let location = resolution.location();
        let preset = resolution.preset();

        let (sample, temperature_source) = match preset {
            Some(entry) => (entry.baseline, TemperatureSource::Preset),
            None => {
                let reading = self.temperature.estimate(&location, offline).await;
                (
                    diurnal::simulate(reading.average, self.random.as_ref()),
                    reading.source,
                )
            }
        };

        let estimate = self
            .uhi
            .estimate(&location, sample.average, preset.map(|entry| entry.reference_uhi))
            .await;

        let preset_note = preset.map(|entry| entry.note.as_str());
        let report = UhiReport {
            city: query.to_string(),
            location,
            sample,
            uhi: estimate.value,
            tier: UhiTier::from_uhi(estimate.value),
            advisory: build_advice(estimate.value, preset_note, Some(query)),
            note: preset_note.unwrap_or(LIVE_NOTE).to_string(),
            source_label: source_label(offline).to_string(),
            provenance: Provenance {
                location: resolution.source(),
                temperature: temperature_source,
                uhi: estimate.source,
            },
        };

        info!(
            "Analyzed '{}': UHI {:.1} ({}) at ({}) in {:.3}s",
            query,
            report.uhi,
            report.tier,
            location.format_coordinates(),
            start_time.elapsed().as_secs_f64()
        );

        if let Err(e) = self.log.append(query, &report).await {
            warn!("Failed to record analysis of '{}': {}", query, e);
        }

        Ok(report)
    }
}
