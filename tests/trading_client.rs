mod common;

use axum::{Json, Router, http::StatusCode, routing::{get, post}};
use reqwest::Url;
use serde_json::json;
use std::time::Duration;

use common::*;
use prometheus_gateway::client::*;

async fn client_for(app: Router, token: Option<&str>) -> TradingApiClient {
    let addr = serve(app).await;
    let base = Url::parse(&format!("http://{}{}", addr, PREFIX)).unwrap();
    let client = TradingApiClient::new(base, Duration::from_secs(2)).unwrap();
    match token {
        Some(t) => client.with_token(t),
        None => client,
    }
}

fn btc_signals() -> GenerateSignalsRequest {
    GenerateSignalsRequest::new("1h", vec!["BTC/USDT".to_string()])
}

#[tokio::test]
async fn generate_signals_decodes_signal_list() {
    let app = Router::new().route(
        "/api/trading/generate-signals",
        post(|Json(body): Json<serde_json::Value>| async move {
            assert_eq!(body["timeframe"], "1h");
            assert_eq!(body["pairs"], json!(["BTC/USDT"]));
            Json(json!({
                "signals": [{
                    "pair": "BTC/USDT",
                    "direction": "buy",
                    "confidence": 0.8,
                    "timestamp": "2025-01-01T00:00:00Z",
                    "indicators": {"rsi": 31.2}
                }]
            }))
        }),
    );
    let client = client_for(app, Some(FREE_TOKEN)).await;

    let response = client.generate_signals(&btc_signals()).await.unwrap();
    assert_eq!(response.signals.len(), 1);
    let signal = &response.signals[0];
    assert_eq!(signal.pair, "BTC/USDT");
    assert_eq!(signal.direction, Direction::Buy);
    assert_eq!(signal.confidence, 0.8);
    assert!(signal.indicators.is_some());
}

#[tokio::test]
async fn missing_required_field_is_decode_error() {
    let app = Router::new().route(
        "/api/trading/generate-signals",
        post(|| async { Json(json!({"result": []})) }),
    );
    let client = client_for(app, Some(FREE_TOKEN)).await;

    let err = client.generate_signals(&btc_signals()).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn out_of_range_confidence_is_decode_error() {
    let app = Router::new().route(
        "/api/trading/generate-signals",
        post(|| async {
            Json(json!({
                "signals": [{
                    "pair": "BTC/USDT",
                    "direction": "sell",
                    "confidence": 1.5,
                    "timestamp": "2025-01-01T00:00:00Z"
                }]
            }))
        }),
    );
    let client = client_for(app, Some(FREE_TOKEN)).await;

    let err = client.generate_signals(&btc_signals()).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn gateway_rejection_carries_status_and_message() {
    let app = Router::new()
        .route(
            "/api/trading/execute-trade",
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"error": "subscription required"})),
                )
            }),
        )
        .route(
            "/api/trading/market-analysis",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"error": "entitlement service unavailable"})),
                )
            }),
        );
    let client = client_for(app, Some(FREE_TOKEN)).await;

    let trade = ExecuteTradeRequest {
        user_id: "free-user".to_string(),
        api_key: "exchange-key".to_string(),
        trade: TradeOrder {
            exchange: "binance".to_string(),
            symbol: "BTC/USDT".to_string(),
            order_type: "market".to_string(),
            side: Side::Buy,
            amount: 0.1,
            price: None,
        },
    };
    let err = client.execute_trade(&trade).await.unwrap_err();
    match &err {
        ClientError::GatewayRejected { status, message } => {
            assert_eq!(*status, StatusCode::FORBIDDEN);
            assert_eq!(message, "subscription required");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_retryable());

    let err = client
        .market_analysis(&MarketAnalysisRequest {
            markets: vec!["BTC/USDT".to_string()],
            timeframe: "1d".to_string(),
            lookback_days: 30,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn non_json_rejection_body_is_kept_as_text() {
    let app = Router::new().route(
        "/api/trading/portfolio-optimization",
        post(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded") }),
    );
    let client = client_for(app, None).await;

    let err = client
        .portfolio_optimization(&PortfolioOptimizationRequest {
            user_id: "u1".to_string(),
            risk_tolerance: 0.3,
            investment_horizon: "5y".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        ClientError::GatewayRejected { status, message } => {
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn get_portfolio_decodes_snapshot() {
    let app = Router::new().route(
        "/api/trading/portfolio/{user_id}",
        get(|axum::extract::Path(user_id): axum::extract::Path<String>| async move {
            assert_eq!(user_id, "user-42");
            Json(json!({
                "assets": [{"id": "a1", "symbol": "BTC", "allocation": 1.0, "value": 500.0}],
                "totalValue": 500.0,
                "lastUpdated": "2025-01-01T12:00:00Z"
            }))
        }),
    );
    let client = client_for(app, Some(FREE_TOKEN)).await;

    let snapshot = client.get_portfolio("user-42").await.unwrap();
    assert_eq!(snapshot.assets.len(), 1);
    assert_eq!(snapshot.assets[0].symbol, "BTC");
    assert_eq!(snapshot.total_value, 500.0);
}

#[tokio::test]
async fn client_through_gateway_to_upstream() {
    let (base, mock) = start_stack().await;
    let client = TradingApiClient::new(
        Url::parse(&format!("{}{}", base, PREFIX)).unwrap(),
        Duration::from_secs(2),
    )
    .unwrap()
    .with_token(FREE_TOKEN);

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");

    let response = client.generate_signals(&btc_signals()).await.unwrap();
    assert_eq!(response.signals[0].confidence, 0.8);

    let snapshot = client.get_portfolio("free-user").await.unwrap();
    assert_eq!(snapshot.total_value, 100000.0);

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| {
        c.headers.get("authorization").unwrap() == &format!("Bearer {}", UPSTREAM_SECRET)
    }));
}
