//! Outbound leg: the credentialed call to the trading service.
//!
//! Only the JSON body and a freshly built header set cross this boundary.
//! Inbound headers are never copied; the caller's credential is never sent.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderValue, Method, StatusCode, header};
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

/// What the gateway sends upstream.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// Operation name (for logging)
    pub operation: String,
    pub method: Method,
    /// Path relative to the upstream base URL, no leading slash
    pub path: String,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// What comes back; relayed to the caller as-is.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream unreachable: {0}")]
    Transport(String),

    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),
}

/// Content type sent when the caller did not supply one.
pub fn json_content_type() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

/// Issues exactly one call per request. Implementations must not retry.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError>;
}

/// Validated upstream endpoint and credential.
#[derive(Clone)]
pub struct UpstreamTarget {
    base_url: Url,
    authorization: HeaderValue,
}

impl UpstreamTarget {
    pub fn new(base_url: Url, credential: &str) -> Result<Self, UpstreamError> {
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidRequest(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", credential))
            .map_err(|_| {
                UpstreamError::InvalidRequest("credential is not a valid header value".to_string())
            })?;
        authorization.set_sensitive(true);
        Ok(Self {
            base_url,
            authorization,
        })
    }

    /// `{base}/{path}`; the base's own path prefix is preserved.
    pub fn url_for(&self, path: &str) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                UpstreamError::InvalidRequest("base URL cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            for segment in path.split('/') {
                // url would collapse these silently and change the target path
                if segment.is_empty() || segment == "." || segment == ".." {
                    return Err(UpstreamError::InvalidRequest(format!(
                        "path {:?} has an empty or dot segment",
                        path
                    )));
                }
                segments.push(segment);
            }
        }
        Ok(url)
    }
}

impl std::fmt::Debug for UpstreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamTarget")
            .field("base_url", &self.base_url.as_str())
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// reqwest-backed upstream.
pub struct HttpUpstream {
    client: reqwest::Client,
    target: UpstreamTarget,
    timeout: Duration,
}

impl HttpUpstream {
    pub fn new(client: reqwest::Client, target: UpstreamTarget, timeout: Duration) -> Self {
        Self {
            client,
            target,
            timeout,
        }
    }

    fn build(&self, request: ProxyRequest) -> Result<reqwest::Request, UpstreamError> {
        let url = self.target.url_for(&request.path)?;
        let content_type = request
            .content_type
            .unwrap_or_else(json_content_type);

        self.client
            .request(request.method, url)
            .timeout(self.timeout)
            .header(header::AUTHORIZATION, self.target.authorization.clone())
            .header(header::CONTENT_TYPE, content_type)
            .body(request.body)
            .build()
            .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
        let outbound = self.build(request)?;

        let response = self.client.execute(outbound).await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout)
            } else {
                UpstreamError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout)
            } else {
                UpstreamError::Transport(e.to_string())
            }
        })?;

        Ok(ProxyResponse {
            status,
            content_type,
            body,
        })
    }
}
