use reqwest::StatusCode;
use thiserror::Error;

/// Why a client call ended in `Failed`.
///
/// The three kinds are kept apart so automated callers can tell "could not
/// reach it" from "it said no" from "it answered in a shape we don't know".
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request never produced an HTTP response
    #[error("transport error: {0}")]
    Transport(String),

    /// Gateway (or upstream, relayed) answered with a non-2xx status
    #[error("rejected with status {status}: {message}")]
    GatewayRejected { status: StatusCode, message: String },

    /// 2xx response whose body does not match the expected contract
    #[error("decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether retrying the same call with backoff is reasonable.
    ///
    /// Only transport failures and "unavailable" statuses qualify; the client
    /// itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::GatewayRejected { status, .. } => matches!(
                *status,
                StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
            Self::Decode(_) => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::GatewayRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
