//! HTTP surface: the dashboard page, its form submit, and a JSON mirror.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, Json, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::common::error::{DashError, DashResult, ErrorClass, FieldError};
use crate::data::service::FeatureLayout;
use crate::inference::domain::{FeatureOverrides, Label};

use super::page::{self, PageView};
use super::state::AppState;

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(submit))
        .route("/api/predict", post(api_predict))
        .route("/api/features", get(api_features))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(state: SharedState, addr: SocketAddr) -> DashResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| DashError::config(format!("cannot bind {addr}: {err}")))?;
    info!(%addr, "dashboard listening on http://{addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| DashError::internal(format!("server error: {err}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

fn status_for(err: &DashError) -> StatusCode {
    match err.class() {
        ErrorClass::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorClass::Request | ErrorClass::Startup => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn index(State(state): State<SharedState>) -> Html<String> {
    let values = page::default_values(&state);
    Html(page::render(&PageView::new(&state, &values)))
}

async fn submit(
    State(state): State<SharedState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> (StatusCode, Html<String>) {
    let mut values = page::default_values(&state);
    values.extend(fields.iter().cloned());

    let result = FeatureOverrides::parse(
        state.assembler.catalog(),
        fields.iter().map(|(name, raw)| (name.as_str(), raw.as_str())),
    )
    .and_then(|overrides| state.assembler.predict(&overrides));

    match result {
        Ok(outcome) => {
            let view = PageView {
                outcome: Some(&outcome),
                ..PageView::new(&state, &values)
            };
            (StatusCode::OK, Html(page::render(&view)))
        }
        Err(err) => {
            let status = status_for(&err);
            let message = err.to_string();
            let view = match err.class() {
                ErrorClass::Validation => PageView {
                    field_errors: err.field_errors(),
                    ..PageView::new(&state, &values)
                },
                _ => {
                    error!(code = err.code().as_str(), error = %err, "prediction failed");
                    PageView {
                        banner: Some(&message),
                        ..PageView::new(&state, &values)
                    }
                }
            };
            (status, Html(page::render(&view)))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub overrides: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct FeatureValueDto {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub ok: bool,
    pub label: Label,
    pub probability: f64,
    pub probability_display: String,
    pub threshold: f64,
    pub model_id: String,
    pub features: Vec<FeatureValueDto>,
}

#[derive(Debug, Serialize)]
pub struct FieldErrorDto {
    pub feature: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub code: &'static str,
    pub error: String,
    pub fields: Vec<FieldErrorDto>,
}

/// JSON rendering of a [`DashError`].
pub struct ApiError(pub DashError);

impl From<DashError> for ApiError {
    fn from(err: DashError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(code = self.0.code().as_str(), error = %self.0, "api prediction failed");
        }
        let body = ErrorResponse {
            ok: false,
            code: self.0.code().as_str(),
            error: self.0.to_string(),
            fields: self
                .0
                .field_errors()
                .iter()
                .map(|f| FieldErrorDto {
                    feature: f.feature.clone(),
                    message: f.message.clone(),
                })
                .collect(),
        };
        (status, Json(body)).into_response()
    }
}

fn overrides_from_json(
    state: &AppState,
    raw: &BTreeMap<String, serde_json::Value>,
) -> DashResult<FeatureOverrides> {
    let catalog = state.assembler.catalog();
    let mut overrides = FeatureOverrides::new();
    let mut errors = Vec::new();
    for (name, value) in raw {
        let Some(number) = value.as_f64() else {
            errors.push(FieldError::new(name, format!("{value} is not a number")));
            continue;
        };
        if let Err(err) = overrides.insert(catalog, name, number) {
            errors.extend(err.field_errors().iter().cloned());
        }
    }
    if errors.is_empty() {
        Ok(overrides)
    } else {
        Err(DashError::InvalidInput(errors))
    }
}

async fn api_predict(
    State(state): State<SharedState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(req) =
        body.map_err(|rejection| DashError::invalid("overrides", rejection.body_text()))?;
    let overrides = overrides_from_json(&state, &req.overrides)?;
    let outcome = state.assembler.predict(&overrides)?;
    let catalog = state.assembler.catalog();
    Ok(Json(PredictResponse {
        ok: true,
        label: outcome.prediction.label,
        probability: outcome.prediction.probability,
        probability_display: outcome.prediction.probability_display(),
        threshold: state.assembler.threshold().value(),
        model_id: state.assembler.classifier().model_id().to_string(),
        features: outcome
            .vector
            .named(catalog)
            .map(|(name, value)| FeatureValueDto {
                name: name.to_string(),
                value,
            })
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub model_id: String,
    pub model_kind: &'static str,
    pub threshold: f64,
    pub features: Vec<FeatureValueDto>,
    pub layout: FeatureLayout,
}

async fn api_features(State(state): State<SharedState>) -> Json<FeaturesResponse> {
    let assembler = &state.assembler;
    Json(FeaturesResponse {
        model_id: assembler.classifier().model_id().to_string(),
        model_kind: assembler.classifier().kind().as_str(),
        threshold: assembler.threshold().value(),
        features: assembler
            .catalog()
            .iter()
            .zip(assembler.defaults().as_slice().iter().copied())
            .map(|(name, value)| FeatureValueDto {
                name: name.to_string(),
                value,
            })
            .collect(),
        layout: state.layout.clone(),
    })
}
