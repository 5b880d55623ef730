//! Caller identity resolution.
//!
//! ## Components
//! - [`IdentityVerifier`]: the single place inbound credentials are checked
//! - [`JwtIdentityVerifier`]: HS256 bearer tokens
//! - [`StaticIdentityVerifier`]: fixed token table for local runs and tests

pub mod jwt;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub use jwt::{Claims, JwtIdentityVerifier};

/// Opaque, request-scoped caller reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub subject: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subject)
    }
}

/// Who the gateway is serving for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Identified(Identity),
}

impl Caller {
    pub fn subject(&self) -> &str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Identified(id) => &id.subject,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Invalid token format")]
    MalformedCredential,

    #[error("Invalid or expired token: {0}")]
    Rejected(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Resolves the caller's identity from inbound request headers.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, headers: &HeaderMap) -> Result<Identity, IdentityError>;
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, IdentityError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(IdentityError::MissingCredential)?
        .to_str()
        .map_err(|_| IdentityError::MalformedCredential)?;

    // Auth scheme names are case-insensitive
    let (scheme, token) = value
        .trim_start()
        .split_once(' ')
        .ok_or(IdentityError::MalformedCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(IdentityError::MalformedCredential);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(IdentityError::MalformedCredential);
    }
    Ok(token)
}

/// Fixed token → subject table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityVerifier {
    pub fn new<I, T, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (T, S)>,
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, subject)| (token.into(), Identity::new(subject)))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Result<Identity, IdentityError> {
        let token = bearer_token(headers)?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("unknown token".to_string()))
    }
}
