use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use sepsis_dash::api::{router, AppState};
use sepsis_dash::data::{DefaultVector, FeatureCatalog, ReferenceRecord};
use sepsis_dash::model::LoadedModel;
use sepsis_dash::AppCfg;

/// HR/Temp/Age catalog; the model only looks at HR: p = sigmoid(0.1·HR − 9).
fn app_with_model(model_json: &str) -> Router {
    let catalog = FeatureCatalog::new(vec!["HR".into(), "Temp".into(), "Age".into()]).unwrap();
    let defaults = DefaultVector::new(&catalog, vec![110.0, 39.2, 61.0]).unwrap();
    let reference = ReferenceRecord {
        source: PathBuf::from("fixture.csv"),
        catalog,
        defaults,
        row: 2,
    };
    let model = LoadedModel::from_json(model_json).unwrap();
    let cfg = AppCfg {
        key_vitals: vec!["HR".into(), "Temp".into()],
        ..AppCfg::default()
    };
    let state = AppState::from_parts(reference, Arc::new(model), &cfg).unwrap();
    router(Arc::new(state))
}

fn app() -> Router {
    app_with_model(
        r#"{"model_id": "lr", "feature_names": ["HR", "Temp", "Age"], "kind": "logistic",
            "weights": [0.1, 0.0, 0.0], "bias": -9.0}"#,
    )
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn index_prefills_defaults() {
    let (status, body) = send(app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="HR" value="110""#));
    assert!(body.contains(r#"name="Age" value="61""#));
    assert!(body.contains("Run Sepsis Prediction"));
    assert!(!body.contains("Prediction Result"));
}

#[tokio::test]
async fn submit_with_defaults_is_positive() {
    let (status, body) = send(app(), form("HR=110&Temp=39.2&Age=61")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Sepsis Detected! Probability: 0.88"));
    assert!(body.contains("<tr><td>HR</td><td>110</td></tr>"));
}

#[tokio::test]
async fn submit_with_lower_heart_rate_is_negative() {
    let (status, body) = send(app(), form("HR=80&Temp=39.2&Age=61")).await;
    assert_eq!(status, StatusCode::OK);
    // sigmoid(8 - 9) = 0.27
    assert!(body.contains("No Sepsis Detected. Probability: 0.27"));
    assert!(body.contains("<tr><td>HR</td><td>80</td></tr>"));
}

#[tokio::test]
async fn non_numeric_field_is_reported_inline() {
    let (status, body) = send(app(), form("HR=fast&Temp=39.2&Age=61")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains(r#"name="HR" value="fast" inputmode="decimal" aria-invalid="true""#));
    assert!(body.contains("&quot;fast&quot; is not a number"));
    assert!(!body.contains("Prediction Result"));
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let (status, body) = send(app(), form("HR=110&Lactate=4.1")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Lactate: unknown feature"));
}

#[tokio::test]
async fn shape_mismatch_renders_error_banner() {
    let narrow = app_with_model(
        r#"{"model_id": "narrow", "kind": "logistic", "weights": [0.1, 0.0], "bias": 0.0}"#,
    );
    let (status, body) = send(narrow, form("HR=110&Temp=39.2&Age=61")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("classifier expects 2 features, got 3"));
}

#[tokio::test]
async fn api_predict_accepts_partial_overrides() {
    let (status, body) = send(app(), json("/api/predict", r#"{"overrides": {"HR": 80}}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["ok"], true);
    assert_eq!(v["label"], "negative");
    assert_eq!(v["probability_display"], "0.27");
    assert_eq!(v["threshold"], 0.5);
    let features: Vec<(String, f64)> = v["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| (f["name"].as_str().unwrap().to_string(), f["value"].as_f64().unwrap()))
        .collect();
    assert_eq!(
        features,
        [
            ("HR".to_string(), 80.0),
            ("Temp".to_string(), 39.2),
            ("Age".to_string(), 61.0)
        ]
    );
}

#[tokio::test]
async fn api_predict_without_overrides_uses_defaults() {
    let (status, body) = send(app(), json("/api/predict", "{}")).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["label"], "positive");
    assert_eq!(v["probability_display"], "0.88");
}

#[tokio::test]
async fn api_predict_reports_bad_fields() {
    let (status, body) = send(
        app(),
        json("/api/predict", r#"{"overrides": {"HR": "high", "SBP": 120}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["ok"], false);
    assert_eq!(v["code"], "invalid_input");
    let fields: Vec<&str> = v["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["feature"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["HR", "SBP"]);
}

#[tokio::test]
async fn api_predict_malformed_body_uses_error_envelope() {
    for body in [r#"{"overrides": [1, 2]}"#, "{not json"] {
        let (status, text) = send(app(), json("/api/predict", body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["ok"], false);
        assert_eq!(v["code"], "invalid_input");
        assert_eq!(v["fields"][0]["feature"], "overrides");
    }
}

#[tokio::test]
async fn api_predict_extreme_values_still_score() {
    let wide = app_with_model(
        r#"{"model_id": "wide", "feature_names": ["HR", "Temp", "Age"], "kind": "logistic",
            "weights": [10.0, 10.0, 0.0], "bias": -9.0}"#,
    );
    let (status, body) = send(
        wide,
        json(
            "/api/predict",
            r#"{"overrides": {"HR": 1.79e308, "Temp": -1.79e308, "Age": 1.79e308}}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["ok"], true);
    assert_eq!(v["label"], "negative");
    assert_eq!(v["probability_display"], "0.00");
}

#[tokio::test]
async fn api_features_lists_catalog_and_layout() {
    let (status, body) = send(app(), get("/api/features")).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["model_id"], "lr");
    assert_eq!(v["model_kind"], "logistic");
    assert_eq!(v["features"][1]["name"], "Temp");
    assert_eq!(v["features"][1]["value"], 39.2);
    assert_eq!(v["layout"]["vitals_left"][0], "HR");
    assert_eq!(v["layout"]["other"][0], "Age");
}
