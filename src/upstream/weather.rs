//! Current temperature from the Open-Meteo forecast API (no API key required)

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{Lookup, WeatherSource, retrying_client};
use crate::config::ServicesConfig;
use crate::models::Location;

/// Readings beyond this magnitude are treated as a broken upstream
const MAX_PLAUSIBLE_CELSIUS: f64 = 100.0;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    // Kept loose: a string or null here means "no reading", not a parse failure
    temperature: Option<Value>,
}

pub struct OpenMeteoWeather {
    client: ClientWithMiddleware,
    base_url: String,
}

impl OpenMeteoWeather {
    pub fn new(config: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            client: retrying_client(&config.user_agent, config.timeout(), config.max_retries)?,
            base_url: config.weather_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, location: &Location) -> Result<Option<f64>> {
        let url = format!(
            "{}/forecast?latitude={:.4}&longitude={:.4}&current_weather=true",
            self.base_url, location.latitude, location.longitude
        );
        debug!("OpenMeteo API request URL: {}", url);

        let response: ForecastResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Failed to parse OpenMeteo weather response")?;

        let temperature = response
            .current_weather
            .and_then(|current| current.temperature)
            .and_then(|temperature| temperature.as_f64());

        if let Some(celsius) = temperature
            && celsius.abs() > MAX_PLAUSIBLE_CELSIUS
        {
            bail!("Implausible temperature reading {celsius}°C");
        }

        Ok(temperature)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoWeather {
    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    async fn current_temperature(&self, location: &Location) -> Lookup<f64> {
        let start_time = Instant::now();
        let lookup = Lookup::from(self.fetch(location).await).finite();

        match &lookup {
            Lookup::Found(temperature) => info!(
                "Current temperature {:.1}°C retrieved in {:.3}s",
                temperature,
                start_time.elapsed().as_secs_f64()
            ),
            Lookup::Unavailable(reason) => warn!("Live weather unavailable: {}", reason),
        }

        lookup
    }
}
