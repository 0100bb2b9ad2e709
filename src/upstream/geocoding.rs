//! Forward geocoding via Nominatim (OpenStreetMap) - free, no API key required.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{Geocoder, Lookup, retrying_client};
use crate::config::ServicesConfig;
use crate::models::Location;

/// Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

pub struct NominatimGeocoder {
    client: ClientWithMiddleware,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            client: retrying_client(&config.user_agent, config.timeout(), config.max_retries)?,
            base_url: config.geocoding_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, query: &str) -> Result<Option<Location>> {
        let url = format!(
            "{}/search?format=json&limit=1&q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        debug!("Nominatim request URL: {}", url);

        let places: Vec<NominatimPlace> = self
            .client
            .get(&url)
            .header("Accept-Language", "en")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Failed to parse Nominatim search response")?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let latitude: f64 = place
            .lat
            .trim()
            .parse()
            .with_context(|| format!("Invalid latitude: {}", place.lat))?;
        let longitude: f64 = place
            .lon
            .trim()
            .parse()
            .with_context(|| format!("Invalid longitude: {}", place.lon))?;

        if let Some(name) = &place.display_name {
            debug!("Best match: {}", name);
        }

        Ok(Some(Location::new(latitude, longitude)?))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn locate(&self, query: &str) -> Lookup<Location> {
        let start_time = Instant::now();
        let lookup = Lookup::from(self.search(query).await);

        match &lookup {
            Lookup::Found(location) => info!(
                "Geocoded '{}' to ({}) in {:.3}s",
                query,
                location.format_coordinates(),
                start_time.elapsed().as_secs_f64()
            ),
            Lookup::Unavailable(reason) => {
                warn!("Geocoding '{}' unavailable: {}", query, reason);
            }
        }

        lookup
    }
}
