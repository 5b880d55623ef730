//! Prometheus Gateway - authenticated forwarding gateway for the trading-signal service
//!
//! Sits between untrusted callers and the credentialed upstream trading API.
//!
//! # Modules
//!
//! - [`policy`] - Operation → required entitlement level table
//! - [`registry`] - Routable operations and path resolution
//! - [`identity`] - Caller identity verification (JWT, static)
//! - [`entitlement`] - Subscription checks (HTTP, static, TTL cache)
//! - [`upstream`] - Credentialed outbound call
//! - [`gateway`] - Forwarding pipeline and axum server
//! - [`client`] - Typed client for the gateway's operations
//! - [`config`] - YAML configuration + env overrides
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod logging;

pub mod policy;
pub mod registry;

pub mod entitlement;
pub mod identity;
pub mod upstream;

pub mod client;
pub mod gateway;

// Convenient re-exports at crate root
pub use client::{ClientError, TradingApiClient};
pub use config::{AppConfig, ConfigError};
pub use entitlement::{EntitlementChecker, EntitlementError};
pub use gateway::{Gateway, GatewayError, InboundRequest};
pub use identity::{Identity, IdentityError, IdentityVerifier};
pub use policy::{AccessPolicy, EntitlementLevel};
pub use registry::{OperationRegistry, OperationSpec};
pub use upstream::{ProxyRequest, ProxyResponse, Upstream, UpstreamError};
