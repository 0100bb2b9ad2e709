use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;

use crate::{
    UrbanHeatError,
    advisory::{UhiTier, render_html},
    models::{LogRecord, Provenance, UhiReport},
    pipeline::Analyzer,
};

/// Number of records returned by the history endpoint
pub const HISTORY_LIMIT: usize = 20;

const QUERY_REQUIRED: &str = "query string required";

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAnalysis {
    pub city: String,
    pub coords: [f64; 2],
    pub avg: f64,
    pub high: f64,
    pub low: f64,
    pub uhi: f64,
    pub tier: UhiTier,
    pub advice: Vec<String>,
    pub advice_html: String,
    pub note: String,
    pub source: String,
    pub provenance: Provenance,
}

impl From<UhiReport> for ApiAnalysis {
    fn from(report: UhiReport) -> Self {
        // every report carries the city label as its first advisory line
        let advice_html = render_html(&report.advisory, true);
        Self {
            coords: report.location.as_pair(),
            avg: report.sample.average,
            high: report.sample.high,
            low: report.sample.low,
            uhi: report.uhi,
            tier: report.tier,
            advice_html,
            advice: report.advisory,
            note: report.note,
            source: report.source_label,
            provenance: report.provenance,
            city: report.city,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiHistoryEntry {
    pub id: u64,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub avg: f64,
    pub high: f64,
    pub low: f64,
    pub uhi: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&LogRecord> for ApiHistoryEntry {
    fn from(record: &LogRecord) -> Self {
        let report = &record.report;
        Self {
            id: record.id,
            city: record.query.clone(),
            lat: report.location.latitude,
            lon: report.location.longitude,
            avg: report.sample.average,
            high: report.sample.high,
            low: report.sample.low,
            uhi: report.uhi,
            created_at: record.created_at,
        }
    }
}

/// Error body returned by every endpoint
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<UrbanHeatError> for ApiError {
    fn from(err: UrbanHeatError) -> Self {
        match err {
            UrbanHeatError::Validation { message } => ApiError::BadRequest(message),
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal(other.user_message())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "server_error", "detail": detail })),
            )
                .into_response(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/history", get(get_history))
        .route("/presets", get(get_presets))
        .with_state(state)
}

/// Pull `(query, offline)` out of a request body.
///
/// Anything that is not an object with a non-blank string `query` is rejected;
/// `offline` defaults to false.
fn parse_analyze_body(body: &[u8]) -> Result<(String, bool), ApiError> {
    let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

    let query = payload
        .get("query")
        .and_then(Value::as_str)
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(QUERY_REQUIRED.to_string()))?;
    let offline = payload
        .get("offline")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok((query.to_string(), offline))
}

async fn analyze(State(state): State<AppState>, body: Bytes) -> Result<Json<ApiAnalysis>, ApiError> {
    let (query, offline) = parse_analyze_body(&body)?;
    let report = state.analyzer.analyze(&query, offline).await?;
    Ok(Json(ApiAnalysis::from(report)))
}

async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<ApiHistoryEntry>>, ApiError> {
    let records = state.analyzer.query_log().recent(HISTORY_LIMIT).await?;
    Ok(Json(records.iter().map(ApiHistoryEntry::from).collect()))
}

async fn get_presets(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.analyzer.catalog().keys().map(str::to_string).collect())
}
