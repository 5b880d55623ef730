pub mod error;
pub mod forward;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{any, get},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppConfig, ConfigError, EntitlementProvider};
use crate::entitlement::{
    CachedEntitlementChecker, EntitlementChecker, HttpEntitlementChecker, StaticEntitlementChecker,
};
use crate::identity::JwtIdentityVerifier;
use crate::policy::AccessPolicy;
use crate::registry::OperationRegistry;
use crate::upstream::{HttpUpstream, UpstreamTarget};

pub use error::{ErrorBody, GatewayError};
pub use forward::{Gateway, GatewayTimeouts, InboundRequest};
pub use state::AppState;

/// Normalise a route prefix to `/segment[/segment..]` or the empty string.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Build the HTTP router around a ready gateway.
pub fn router(gateway: Gateway, prefix: &str) -> Router {
    let state = Arc::new(AppState::new(gateway));
    let forward_route = format!("{}/{{*path}}", normalize_prefix(prefix));

    Router::new()
        .route("/health", get(handlers::health_check))
        // Method filtering happens in the registry so unmapped methods read as 404
        .route(&forward_route, any(handlers::forward_operation))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Wire the production gateway from configuration.
///
/// Fails on any missing or invalid startup value; nothing is served on error.
pub fn build_gateway(config: &AppConfig) -> Result<Gateway, ConfigError> {
    let secrets = config.resolve_secrets()?;

    let http = reqwest::Client::builder()
        .connect_timeout(config.timeouts.connect())
        .build()
        .map_err(|e| ConfigError::Misconfigured(format!("HTTP client: {}", e)))?;

    let target = UpstreamTarget::new(secrets.upstream_base_url, &secrets.upstream_api_key)
        .map_err(|e| ConfigError::Misconfigured(e.to_string()))?;
    let upstream = HttpUpstream::new(http.clone(), target, config.timeouts.upstream());

    let identity = JwtIdentityVerifier::new(&secrets.jwt_secret);
    let entitlement = build_entitlement(config, http)?;

    Ok(Gateway::new(
        Arc::new(OperationRegistry::trading_defaults()),
        Arc::new(AccessPolicy::default_table()),
        Arc::new(identity),
        entitlement,
        Arc::new(upstream),
    )
    .with_timeouts(GatewayTimeouts::from(&config.timeouts)))
}

fn build_entitlement(
    config: &AppConfig,
    http: reqwest::Client,
) -> Result<Arc<dyn EntitlementChecker>, ConfigError> {
    let cache = config.entitlement.cache.as_ref();
    match &config.entitlement.provider {
        EntitlementProvider::Http { url, api_key } => {
            let base = reqwest::Url::parse(url).map_err(|e| {
                ConfigError::Misconfigured(format!("entitlement url is not a valid URL: {}", e))
            })?;
            let checker =
                HttpEntitlementChecker::new(http, base, api_key.clone(), config.timeouts.entitlement());
            Ok(with_cache(checker, cache))
        }
        EntitlementProvider::Static { subscribers } => {
            tracing::warn!(
                count = subscribers.len(),
                "using static entitlement list; not for production"
            );
            Ok(with_cache(
                StaticEntitlementChecker::new(subscribers.iter().cloned()),
                cache,
            ))
        }
    }
}

fn with_cache<C: EntitlementChecker + 'static>(
    checker: C,
    cache: Option<&crate::config::EntitlementCacheConfig>,
) -> Arc<dyn EntitlementChecker> {
    match cache {
        Some(c) => Arc::new(CachedEntitlementChecker::new(
            checker,
            std::time::Duration::from_secs(c.ttl_secs),
            c.max_entries,
        )),
        None => Arc::new(checker),
    }
}

/// Start HTTP Gateway server
pub async fn run_server(config: &AppConfig, gateway: Gateway) -> std::io::Result<()> {
    let prefix = normalize_prefix(&config.gateway.prefix);
    let app = router(gateway, &prefix);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("Forwarding {}/* to upstream", prefix);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
