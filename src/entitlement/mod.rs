//! Subscription entitlement checks.
//!
//! The source of truth is external. A checker answers `Ok(true)`/`Ok(false)`
//! when it got a definitive answer and `Err(_)` when it could not find out;
//! the gateway treats the latter as not entitled and reports it as
//! unavailable rather than forbidden.

pub mod cache;
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::identity::Identity;
use crate::policy::EntitlementLevel;

pub use cache::CachedEntitlementChecker;
pub use http::HttpEntitlementChecker;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("Entitlement service unreachable: {0}")]
    Unreachable(String),

    #[error("Entitlement service returned status {0}")]
    BadStatus(u16),

    #[error("Malformed entitlement record: {0}")]
    Malformed(String),
}

/// Subscription tier as reported by the entitlement service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Subscribed,
    /// Any tier this gateway does not know; grants nothing.
    #[serde(other)]
    Unknown,
}

impl Tier {
    pub fn grants(self, level: EntitlementLevel) -> bool {
        match self {
            Self::Unknown => false,
            Self::Free => level <= EntitlementLevel::Authenticated,
            Self::Subscribed => true,
        }
    }
}

/// (identity, tier, validity window)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementRecord {
    pub subject: String,
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

impl EntitlementRecord {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.valid_from.is_none_or(|from| from <= now);
        let not_ended = self.valid_until.is_none_or(|until| now < until);
        started && not_ended
    }

    pub fn grants(&self, level: EntitlementLevel, now: DateTime<Utc>) -> bool {
        self.is_valid_at(now) && self.tier.grants(level)
    }
}

/// Resolves whether an identity holds the tier an operation requires.
#[async_trait]
pub trait EntitlementChecker: Send + Sync {
    async fn has_entitlement(
        &self,
        identity: &Identity,
        level: EntitlementLevel,
    ) -> Result<bool, EntitlementError>;
}

/// Fixed subscriber set.
#[derive(Debug, Clone, Default)]
pub struct StaticEntitlementChecker {
    subscribers: HashSet<String>,
}

impl StaticEntitlementChecker {
    pub fn new<I, S>(subscribers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subscribers: subscribers.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl EntitlementChecker for StaticEntitlementChecker {
    async fn has_entitlement(
        &self,
        identity: &Identity,
        level: EntitlementLevel,
    ) -> Result<bool, EntitlementError> {
        let tier = if self.subscribers.contains(&identity.subject) {
            Tier::Subscribed
        } else {
            Tier::Free
        };
        Ok(tier.grants(level))
    }
}
