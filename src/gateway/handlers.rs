use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use super::error::GatewayError;
use super::forward::InboundRequest;
use super::state::AppState;

/// Health check response data
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub git_hash: String,
    /// Server timestamp in milliseconds
    pub timestamp_ms: u64,
    pub uptime_secs: u64,
}

/// Health check endpoint
///
/// Gateway-local; never touches the upstream.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        timestamp_ms,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Forward `{prefix}/{*path}` through the gateway pipeline.
pub async fn forward_operation(
    State(state): State<Arc<AppState>>,
    method: Method,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Ok(Path(path)) = path else {
        return GatewayError::NotFound.into_response();
    };

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "forward",
        %request_id,
        method = %method,
        path = %path,
    );

    let request = InboundRequest {
        method,
        path,
        headers,
        body,
    };

    match state.gateway.handle(request).instrument(span).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::debug!(%request_id, error = e.name(), "answered by gateway");
            e.into_response()
        }
    }
}

/// Anything outside the registered routes.
pub async fn not_found() -> GatewayError {
    GatewayError::NotFound
}
