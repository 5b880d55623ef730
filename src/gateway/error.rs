//! Gateway-originated failures.
//!
//! Every per-request failure ends here and is rendered as a status code plus
//! a `{"error": "..."}` body. Upstream error statuses are not in this list:
//! they are relayed verbatim as ordinary responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No registry entry for (method, path)
    #[error("Not found")]
    NotFound,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Subscription required for this operation")]
    Forbidden,

    /// Entitlement could not be determined; safe to retry
    #[error("Entitlement service unavailable, retry later")]
    EntitlementUnavailable,

    #[error("Upstream service unavailable")]
    UpstreamUnavailable,

    #[error("Upstream service timed out")]
    UpstreamTimeout,

    #[error("Gateway misconfigured")]
    Misconfigured,
}

impl GatewayError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::EntitlementUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::EntitlementUnavailable => "ENTITLEMENT_UNAVAILABLE",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::Misconfigured => "MISCONFIGURED",
        }
    }
}

/// JSON body for gateway errors.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.http_status(), Json(body)).into_response()
    }
}
