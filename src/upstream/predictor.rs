//! Client for the UHI prediction service
//!
//! The service takes `{lat, lon, avg_temp}` and answers `{uhi, label, advice}`.
//! Only `uhi` is used; the advisory text is generated locally.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::{Lookup, UhiPredictor};
use crate::config::ServicesConfig;
use crate::models::Location;

#[derive(Debug, Serialize)]
struct PredictRequest {
    lat: f64,
    lon: f64,
    avg_temp: f64,
}

/// No retries here: a slow model should fall back quickly, not be hammered.
pub struct HttpUhiPredictor {
    client: Client,
    url: String,
}

impl HttpUhiPredictor {
    pub fn new(config: &ServicesConfig) -> Result<Self> {
        Self::with_timeout(&config.predictor_url, &config.user_agent, config.predictor_timeout())
    }

    pub fn with_timeout(url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    async fn request(&self, location: &Location, average_temp: f64) -> Result<Option<f64>> {
        let body = PredictRequest {
            lat: location.latitude,
            lon: location.longitude,
            avg_temp: average_temp,
        };
        debug!("Prediction request: {:?}", body);

        let response: Value = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Failed to parse prediction response")?;

        Ok(response.get("uhi").and_then(Value::as_f64))
    }
}

#[async_trait]
impl UhiPredictor for HttpUhiPredictor {
    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    async fn predict(&self, location: &Location, average_temp: f64) -> Lookup<f64> {
        let start_time = Instant::now();
        let lookup = Lookup::from(self.request(location, average_temp).await).finite();

        match &lookup {
            Lookup::Found(uhi) => info!(
                "Predicted UHI {:.1} in {:.3}s",
                uhi,
                start_time.elapsed().as_secs_f64()
            ),
            Lookup::Unavailable(reason) => warn!("Prediction service unavailable: {}", reason),
        }

        lookup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn predictor_for(server: &MockServer, timeout: Duration) -> HttpUhiPredictor {
        HttpUhiPredictor::with_timeout(&format!("{}/predict", server.uri()), "urbanheat-test", timeout)
            .unwrap()
    }

    #[tokio::test]
    async fn test_predict_sends_payload_and_reads_uhi() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_json(serde_json::json!({ "lat": 23.0225, "lon": 72.5714, "avg_temp": 28.5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uhi": 74.2,
                "label": "High",
                "advice": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let location = Location::new(23.0225, 72.5714).unwrap();
        let lookup = predictor_for(&mock_server, Duration::from_secs(3))
            .predict(&location, 28.5)
            .await;
        assert_eq!(lookup, Lookup::Found(74.2));
    }

    #[tokio::test]
    async fn test_non_numeric_uhi_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uhi": "high"
            })))
            .mount(&mock_server)
            .await;

        let location = Location::new(0.0, 0.0).unwrap();
        let lookup = predictor_for(&mock_server, Duration::from_secs(3))
            .predict(&location, 20.0)
            .await;
        assert!(!lookup.is_found());
    }

    #[tokio::test]
    async fn test_bad_request_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "bad_request"
            })))
            .mount(&mock_server)
            .await;

        let location = Location::new(0.0, 0.0).unwrap();
        let lookup = predictor_for(&mock_server, Duration::from_secs(3))
            .predict(&location, 20.0)
            .await;
        assert!(!lookup.is_found());
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "uhi": 50.0 }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let location = Location::new(0.0, 0.0).unwrap();
        let lookup = predictor_for(&mock_server, Duration::from_millis(100))
            .predict(&location, 20.0)
            .await;
        assert!(!lookup.is_found());
    }
}
