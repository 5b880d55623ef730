//! Access policy: which entitlement level each operation requires.
//!
//! The table is plain data, built once at startup and handed to the gateway.
//! Anything not listed requires [`EntitlementLevel::Subscribed`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Authorization level an operation requires.
///
/// Ordered from least to most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementLevel {
    /// Anyone, including anonymous callers
    Public,
    /// Any caller with a verified identity
    Authenticated,
    /// Verified identity holding an active subscription
    Subscribed,
}

impl EntitlementLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Authenticated => "authenticated",
            Self::Subscribed => "subscribed",
        }
    }
}

impl fmt::Display for EntitlementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable operation → level table.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    entries: HashMap<String, EntitlementLevel>,
}

impl AccessPolicy {
    /// Build a policy from explicit entries. Later duplicates win.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, EntitlementLevel)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, level)| (name.into(), level))
                .collect(),
        }
    }

    /// Production table for the trading service operations.
    pub fn default_table() -> Self {
        Self::from_entries([
            ("generate-signals", EntitlementLevel::Authenticated),
            ("market-analysis", EntitlementLevel::Authenticated),
            ("get-portfolio", EntitlementLevel::Authenticated),
            ("portfolio-optimization", EntitlementLevel::Subscribed),
            ("execute-trade", EntitlementLevel::Subscribed),
        ])
    }

    /// Level required for `operation`. Unlisted operations are fail-closed.
    pub fn required_level(&self, operation: &str) -> EntitlementLevel {
        self.entries
            .get(operation)
            .copied()
            .unwrap_or(EntitlementLevel::Subscribed)
    }
}
