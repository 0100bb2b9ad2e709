//! Upstream collaborators: geocoding, live weather and UHI prediction
//!
//! Every collaborator answers with a [`Lookup`] instead of an error. Transport
//! failures, timeouts and malformed payloads all collapse into
//! [`Lookup::Unavailable`], and the pipeline stage that made the call picks
//! its fallback from there.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::models::Location;

pub mod geocoding;
pub mod predictor;
pub mod weather;

pub use geocoding::NominatimGeocoder;
pub use predictor::HttpUhiPredictor;
pub use weather::OpenMeteoWeather;

/// Outcome of a call to an external service
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    /// The service could not answer; carries a reason for the logs
    Unavailable(String),
}

impl<T> Lookup<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Lookup::Unavailable(reason.into())
    }

    #[cfg(test)]
    pub(crate) fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl Lookup<f64> {
    /// Treat NaN and infinities as an unusable answer
    #[must_use]
    pub fn finite(self) -> Self {
        match self {
            Lookup::Found(value) if !value.is_finite() => {
                Lookup::unavailable(format!("non-finite value {value}"))
            }
            other => other,
        }
    }
}

impl<T> From<Result<Option<T>>> for Lookup<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::unavailable("no result"),
            Err(e) => Lookup::Unavailable(format!("{e:#}")),
        }
    }
}

/// Free-text place search
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, query: &str) -> Lookup<Location>;
}

/// Current temperature at a location, in Celsius
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_temperature(&self, location: &Location) -> Lookup<f64>;
}

/// External heat-island prediction model
#[async_trait]
pub trait UhiPredictor: Send + Sync {
    async fn predict(&self, location: &Location, average_temp: f64) -> Lookup<f64>;
}

/// HTTP client with a hard timeout and transient-error retries
pub(crate) fn retrying_client(
    user_agent: &str,
    timeout: Duration,
    max_retries: u32,
) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
