use std::time::Instant;

use super::forward::Gateway;

/// Gateway application state (shared, read-only after startup)
#[derive(Clone)]
pub struct AppState {
    /// Forwarding pipeline
    pub gateway: Gateway,
    /// Process start, reported by the health endpoint
    pub started_at: Instant,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            started_at: Instant::now(),
        }
    }
}
