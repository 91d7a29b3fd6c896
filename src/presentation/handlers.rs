// HTTP request handlers
use crate::application::peak_service::AnalysisRequest;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct AnalysisBody {
    pub sources: Vec<AnalysisRequest>,
    #[serde(default)]
    pub include_windows: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Compute the peak window per group for every uploaded source
pub async fn create_analysis(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalysisBody>,
) -> impl IntoResponse {
    if body.sources.is_empty() {
        return (StatusCode::BAD_REQUEST, "upload at least one source").into_response();
    }

    let compress = accepts_brotli(&headers);
    let report = state
        .peak_service
        .analyze(body.sources, body.include_windows)
        .await;

    match json_response(&report, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
