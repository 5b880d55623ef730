//! The forwarding pipeline: resolve → policy → identity → entitlement → upstream.
//!
//! One inbound request produces at most one upstream call, never retried.
//! Every collaborator call is bounded by a timeout. Dropping the future
//! returned by [`Gateway::handle`] drops the in-flight upstream call with it.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::error::GatewayError;
use crate::config::TimeoutConfig;
use crate::entitlement::EntitlementChecker;
use crate::identity::{Caller, IdentityVerifier};
use crate::policy::{AccessPolicy, EntitlementLevel};
use crate::registry::{OperationRegistry, ResolvedOperation};
use crate::upstream::{ProxyRequest, ProxyResponse, Upstream, UpstreamError};

/// Inbound request after the HTTP layer has done its part.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path below the gateway prefix
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Per-collaborator time bounds.
#[derive(Debug, Clone, Copy)]
pub struct GatewayTimeouts {
    pub identity: Duration,
    pub entitlement: Duration,
    pub upstream: Duration,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

impl From<&TimeoutConfig> for GatewayTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            identity: config.identity(),
            entitlement: config.entitlement(),
            upstream: config.upstream(),
        }
    }
}

/// The trust boundary between callers and the credentialed upstream.
#[derive(Clone)]
pub struct Gateway {
    registry: Arc<OperationRegistry>,
    policy: Arc<AccessPolicy>,
    identity: Arc<dyn IdentityVerifier>,
    entitlement: Arc<dyn EntitlementChecker>,
    upstream: Arc<dyn Upstream>,
    timeouts: GatewayTimeouts,
}

impl Gateway {
    pub fn new(
        registry: Arc<OperationRegistry>,
        policy: Arc<AccessPolicy>,
        identity: Arc<dyn IdentityVerifier>,
        entitlement: Arc<dyn EntitlementChecker>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            registry,
            policy,
            identity,
            entitlement,
            upstream,
            timeouts: GatewayTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: GatewayTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Run the full pipeline for one inbound request.
    pub async fn handle(&self, request: InboundRequest) -> Result<ProxyResponse, GatewayError> {
        let operation = self
            .registry
            .resolve(&request.method, &request.path)
            .ok_or(GatewayError::NotFound)?;

        let level = self.policy.required_level(&operation.name);
        let caller = self.authorize(&operation, level, &request.headers).await?;

        let proxy = ProxyRequest {
            operation: operation.name.clone(),
            method: request.method,
            path: operation.path,
            content_type: request.headers.get(header::CONTENT_TYPE).cloned(),
            body: request.body,
        };
        self.forward(proxy, &caller).await
    }

    /// Identity first, then entitlement when the level demands it.
    async fn authorize(
        &self,
        operation: &ResolvedOperation,
        level: EntitlementLevel,
        headers: &HeaderMap,
    ) -> Result<Caller, GatewayError> {
        if level == EntitlementLevel::Public {
            return Ok(Caller::Anonymous);
        }

        let identity = match timeout(self.timeouts.identity, self.identity.verify(headers)).await {
            Ok(Ok(identity)) => identity,
            Ok(Err(e)) => {
                info!(
                    event = "request_rejected",
                    operation = %operation.name,
                    reason = %e,
                    "identity verification failed"
                );
                return Err(GatewayError::Unauthenticated);
            }
            Err(_) => {
                warn!(
                    event = "request_rejected",
                    operation = %operation.name,
                    timeout_ms = self.timeouts.identity.as_millis() as u64,
                    "identity verification timed out"
                );
                return Err(GatewayError::Unauthenticated);
            }
        };

        if level == EntitlementLevel::Subscribed {
            let check = self.entitlement.has_entitlement(&identity, level);
            match timeout(self.timeouts.entitlement, check).await {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    info!(
                        event = "request_rejected",
                        operation = %operation.name,
                        subject = %identity,
                        "entitlement denied"
                    );
                    return Err(GatewayError::Forbidden);
                }
                Ok(Err(e)) => {
                    warn!(
                        event = "request_rejected",
                        operation = %operation.name,
                        subject = %identity,
                        error = %e,
                        "entitlement check failed"
                    );
                    return Err(GatewayError::EntitlementUnavailable);
                }
                Err(_) => {
                    warn!(
                        event = "request_rejected",
                        operation = %operation.name,
                        subject = %identity,
                        timeout_ms = self.timeouts.entitlement.as_millis() as u64,
                        "entitlement check timed out"
                    );
                    return Err(GatewayError::EntitlementUnavailable);
                }
            }
        }

        Ok(Caller::Identified(identity))
    }

    /// One bounded upstream call; the response is relayed as-is.
    async fn forward(
        &self,
        proxy: ProxyRequest,
        caller: &Caller,
    ) -> Result<ProxyResponse, GatewayError> {
        let operation = proxy.operation.clone();
        let started = Instant::now();
        debug!(operation = %operation, caller = caller.subject(), "forwarding upstream");

        let result = match timeout(self.timeouts.upstream, self.upstream.send(proxy)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.timeouts.upstream)),
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                info!(
                    event = "upstream_response",
                    operation = %operation,
                    caller = caller.subject(),
                    status = response.status.as_u16(),
                    latency_ms,
                    "upstream answered"
                );
                Ok(response)
            }
            Err(e) => {
                warn!(
                    event = "upstream_failed",
                    operation = %operation,
                    caller = caller.subject(),
                    error = %e,
                    latency_ms,
                    "upstream call failed"
                );
                Err(match e {
                    UpstreamError::Timeout(_) => GatewayError::UpstreamTimeout,
                    UpstreamError::Transport(_) => GatewayError::UpstreamUnavailable,
                    UpstreamError::InvalidRequest(_) => GatewayError::Misconfigured,
                })
            }
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();
        headers.remove(header::CONTENT_TYPE);
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}
