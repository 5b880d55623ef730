//! Typed client for the gateway's public contract.
//!
//! One method per operation. Each call is independent: no retries, no
//! caching, no shared in-flight state. The client knows nothing about the
//! gateway's policy table; it just reports what came back.

pub mod error;
pub mod types;

use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::gateway::ErrorBody;
use crate::gateway::handlers::HealthResponse;

pub use error::ClientError;
pub use types::*;

pub struct TradingApiClient {
    http: reqwest::Client,
    /// Gateway base including the operation prefix, e.g. `http://gw/api/trading`
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
}

impl TradingApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Self::with_http_client(http, base_url, timeout)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: Url,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Transport(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }
        Ok(Self {
            http,
            base_url,
            token: None,
            timeout,
        })
    }

    /// Caller's own gateway credential, sent as a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn generate_signals(
        &self,
        request: &GenerateSignalsRequest,
    ) -> Result<SignalsResponse, ClientError> {
        let response: SignalsResponse = self.post("generate-signals", request).await?;
        for signal in &response.signals {
            if !(0.0..=1.0).contains(&signal.confidence) {
                return Err(ClientError::Decode(format!(
                    "confidence {} for {} outside [0, 1]",
                    signal.confidence, signal.pair
                )));
            }
        }
        Ok(response)
    }

    pub async fn market_analysis(
        &self,
        request: &MarketAnalysisRequest,
    ) -> Result<MarketAnalysis, ClientError> {
        self.post("market-analysis", request).await
    }

    pub async fn portfolio_optimization(
        &self,
        request: &PortfolioOptimizationRequest,
    ) -> Result<OptimizationResult, ClientError> {
        self.post("portfolio-optimization", request).await
    }

    /// Submits once. Duplicate submission has real side effects, so a
    /// failed call is never replayed here.
    pub async fn execute_trade(
        &self,
        request: &ExecuteTradeRequest,
    ) -> Result<TradeReceipt, ClientError> {
        let trade = &request.trade;
        info!(
            event = "order_attempt",
            exchange = %trade.exchange,
            symbol = %trade.symbol,
            side = ?trade.side,
            amount = trade.amount,
            "submitting trade"
        );

        let result = self.post("execute-trade", request).await;
        match &result {
            Ok(_) => info!(event = "order_submitted", symbol = %trade.symbol, "trade accepted"),
            Err(e) => warn!(
                event = "order_submission_failed",
                symbol = %trade.symbol,
                error = %e,
                retryable = e.is_retryable(),
                "trade not accepted"
            ),
        }
        result
    }

    pub async fn get_portfolio(&self, user_id: &str) -> Result<PortfolioSnapshot, ClientError> {
        let url = self.url_for(&["portfolio", user_id])?;
        self.execute(self.http.request(Method::GET, url)).await
    }

    /// Probe the gateway's own health endpoint.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self
            .base_url
            .join("/health")
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        self.execute(self.http.get(url)).await
    }

    async fn post<B, T>(&self, operation: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(&[operation])?;
        self.execute(self.http.post(url).json(body)).await
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Transport("base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let mut builder = builder.timeout(self.timeout);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "gateway answered");

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(ClientError::GatewayRejected { status, message });
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
