//! Request and response shapes for the trading operations.
//!
//! Response types are plain data, decoded strictly: a missing required field
//! or a wrong type fails the whole call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

/// Order side for trade execution.
pub type Side = Direction;

// ----------------------------------------------------------------------------
// generate-signals
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSignalsRequest {
    pub timeframe: String,
    pub pairs: Vec<String>,
    pub strategy_params: Map<String, Value>,
}

impl GenerateSignalsRequest {
    pub fn new(timeframe: impl Into<String>, pairs: Vec<String>) -> Self {
        Self {
            timeframe: timeframe.into(),
            pairs,
            strategy_params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.strategy_params.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Signal {
    pub pair: String,
    pub direction: Direction,
    /// Model confidence in `[0, 1]`
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub indicators: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalsResponse {
    pub signals: Vec<Signal>,
}

// ----------------------------------------------------------------------------
// market-analysis
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysisRequest {
    pub markets: Vec<String>,
    pub timeframe: String,
    pub lookback_days: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub regime: String,
    pub average_volatility: f64,
    pub trend_strength: f64,
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub timestamp: DateTime<Utc>,
    /// Per-market volatility or a single figure; shape is owned by the upstream model
    pub volatility: Value,
    /// Per-market trend description
    pub trends: Value,
    pub market_summary: MarketSummary,
}

// ----------------------------------------------------------------------------
// portfolio-optimization
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioOptimizationRequest {
    pub user_id: String,
    pub risk_tolerance: f64,
    pub investment_horizon: String,
}

/// Upstream-defined object; only its being an object is checked.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct OptimizationResult(pub Map<String, Value>);

// ----------------------------------------------------------------------------
// execute-trade
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOrder {
    pub exchange: String,
    pub symbol: String,
    /// Order type, e.g. `market` or `limit`
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: Side,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteTradeRequest {
    pub user_id: String,
    pub api_key: String,
    pub trade: TradeOrder,
}

/// Upstream-defined object; only its being an object is checked.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TradeReceipt(pub Map<String, Value>);

// ----------------------------------------------------------------------------
// portfolio/{userId}
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortfolioAsset {
    pub id: String,
    pub symbol: String,
    pub allocation: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub assets: Vec<PortfolioAsset>,
    pub total_value: f64,
    pub last_updated: DateTime<Utc>,
}
