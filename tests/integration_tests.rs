//! End-to-end tests of the HTTP API against mocked upstream services

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use urbanheat::api::AppState;
use urbanheat::{Analyzer, FjallQueryLog, QueryLog, UrbanHeatConfig, web};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    router: Router,
    _data: TempDir,
    _static: TempDir,
}

async fn spawn_app(upstream: &MockServer) -> TestApp {
    let data = tempfile::tempdir().unwrap();
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>Urban Heat</h1>").unwrap();

    let mut config = UrbanHeatConfig::default();
    config.services.geocoding_url = upstream.uri();
    config.services.weather_url = format!("{}/v1", upstream.uri());
    config.services.predictor_url = format!("{}/predict", upstream.uri());
    config.services.max_retries = 0;
    config.services.predictor_timeout_ms = 500;
    config.analysis.seed = Some(7);

    let log: Arc<dyn QueryLog> = Arc::new(FjallQueryLog::open(data.path()).unwrap());
    let analyzer = Arc::new(Analyzer::from_config(&config, log).unwrap());
    let router = web::app(
        AppState::new(analyzer),
        static_dir.path().to_str().unwrap(),
    );

    TestApp {
        router,
        _data: data,
        _static: static_dir,
    }
}

async fn mount_all_down(upstream: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(upstream)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(upstream)
        .await;
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post_analyze(router: &Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

#[tokio::test]
async fn test_preset_with_prediction_service_down() {
    let upstream = MockServer::start().await;
    mount_all_down(&upstream).await;
    let app = spawn_app(&upstream).await;

    let (status, body) = post_analyze(
        &app.router,
        json!({"query": "Shillong, India", "offline": true}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Shillong, India");
    assert_eq!(body["coords"], json!([25.5788, 91.8933]));
    assert_eq!(body["avg"], 18.5);
    assert_eq!(body["high"], 26.0);
    assert_eq!(body["low"], 8.0);
    assert_eq!(body["uhi"], 22.0);
    assert_eq!(body["tier"], "Low");
    assert_eq!(body["source"], "Simulated (offline)");
    assert_eq!(body["note"], "Hilly & green — low UHI");
    assert_eq!(body["advice"].as_array().unwrap().len(), 4);
    assert_eq!(body["provenance"]["uhi"], "preset_reference");

    let html = body["adviceHtml"].as_str().unwrap();
    assert!(html.starts_with("<ul><li style=\"margin:6px 0\"><strong>Shillong, India</strong>"));
    assert!(html.contains("Hilly &amp; green"));
}

#[tokio::test]
async fn test_preset_prediction_overrides_reference() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({"lat": 25.5941, "lon": 85.1376, "avg_temp": 26.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uhi": 74.5})))
        .expect(1)
        .mount(&upstream)
        .await;
    let app = spawn_app(&upstream).await;

    let (status, body) = post_analyze(&app.router, json!({"query": "Patna, India"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uhi"], 74.5);
    assert_eq!(body["tier"], "High");
    assert_eq!(body["avg"], 26.0);
    assert_eq!(body["provenance"]["uhi"], "predicted");
    assert_eq!(body["provenance"]["temperature"], "preset");
}

#[tokio::test]
async fn test_live_city() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"lat": "18.5204", "lon": "73.8567", "display_name": "Pune"}])),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"current_weather": {"temperature": 31.2}})),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uhi": 58.5})))
        .mount(&upstream)
        .await;
    let app = spawn_app(&upstream).await;

    let (status, body) = post_analyze(&app.router, json!({"query": "Pune"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["coords"], json!([18.5204, 73.8567]));
    assert_eq!(body["avg"], 31.2);
    assert!(body["high"].as_f64().unwrap() > 31.2);
    assert!(body["low"].as_f64().unwrap() < 31.2);
    assert_eq!(body["uhi"], 58.5);
    assert_eq!(body["tier"], "Moderate");
    assert_eq!(body["source"], "Current-based");
    assert_eq!(body["note"], "Live geocode + weather; UHI by ML service");
    assert_eq!(body["advice"][0], "Pune — Simulated city");
    assert_eq!(
        body["provenance"],
        json!({"location": "geocoded", "temperature": "live", "uhi": "predicted"})
    );
}

#[tokio::test]
async fn test_everything_down_falls_back() {
    let upstream = MockServer::start().await;
    mount_all_down(&upstream).await;
    let app = spawn_app(&upstream).await;

    let (status, body) = post_analyze(&app.router, json!({"query": "Atlantis"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["coords"], json!([20.6, 78.9]));
    assert_eq!(body["source"], "Current-based");
    let uhi = body["uhi"].as_f64().unwrap();
    assert!((5.0..=98.0).contains(&uhi));
    let (avg, high, low) = (
        body["avg"].as_f64().unwrap(),
        body["high"].as_f64().unwrap(),
        body["low"].as_f64().unwrap(),
    );
    assert!(low < avg && avg < high);
    assert_eq!(
        body["provenance"],
        json!({"location": "fallback", "temperature": "synthesized", "uhi": "heuristic"})
    );
}

#[tokio::test]
async fn test_invalid_query_is_rejected_without_logging() {
    let upstream = MockServer::start().await;
    mount_all_down(&upstream).await;
    let app = spawn_app(&upstream).await;

    for payload in [json!({}), json!({"query": 7}), json!({"query": "  "})] {
        let (status, body) = post_analyze(&app.router, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "query string required"}));
    }

    let (status, history) = get_json(&app.router, "/api/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_history_is_newest_first_and_capped() {
    let upstream = MockServer::start().await;
    mount_all_down(&upstream).await;
    let app = spawn_app(&upstream).await;

    for i in 1..=22 {
        let (status, _) = post_analyze(
            &app.router,
            json!({"query": format!("Town {i}"), "offline": true}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    post_analyze(&app.router, json!({"query": "Chennai, India", "offline": true})).await;

    let (status, history) = get_json(&app.router, "/api/history").await;
    assert_eq!(status, StatusCode::OK);

    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 20);
    assert_eq!(rows[0]["id"], 23);
    assert_eq!(rows[0]["city"], "Chennai, India");
    assert_eq!(rows[0]["lat"], 13.0827);
    assert_eq!(rows[0]["uhi"], 65.0);
    assert!(rows[0]["created_at"].is_string());
    assert_eq!(rows[1]["city"], "Town 22");
    assert_eq!(rows[19]["id"], 4);
}

#[tokio::test]
async fn test_presets_and_static_fallback() {
    let upstream = MockServer::start().await;
    let app = spawn_app(&upstream).await;

    let (status, presets) = get_json(&app.router, "/api/presets").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = presets
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(names.len(), 7);
    assert_eq!(names[0], "Ahmedabad, India");
    assert_eq!(names[6], "Los Angeles, USA");

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&page[..], b"<h1>Urban Heat</h1>");
}
