//! Entitlement checks backed by the account service's REST API.
//!
//! `GET {base}/entitlements/{subject}` → [`EntitlementRecord`]; 404 means the
//! subject has no entitlement record at all.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, warn};

use super::{EntitlementChecker, EntitlementError, EntitlementRecord};
use crate::identity::Identity;
use crate::policy::EntitlementLevel;

pub struct HttpEntitlementChecker {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpEntitlementChecker {
    pub fn new(
        client: reqwest::Client,
        base_url: Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            timeout,
        }
    }

    fn record_url(&self, subject: &str) -> Result<Url, EntitlementError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EntitlementError::Malformed("base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("entitlements")
            .push(subject);
        Ok(url)
    }

    /// Fetch the raw record. `Ok(None)` when the service has none for `subject`.
    pub async fn fetch_record(
        &self,
        subject: &str,
    ) -> Result<Option<EntitlementRecord>, EntitlementError> {
        let url = self.record_url(subject)?;
        let mut request = self.client.get(url).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EntitlementError::Unreachable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let record = response
                    .json::<EntitlementRecord>()
                    .await
                    .map_err(|e| EntitlementError::Malformed(e.to_string()))?;
                Ok(Some(record))
            }
            status => Err(EntitlementError::BadStatus(status.as_u16())),
        }
    }
}

#[async_trait]
impl EntitlementChecker for HttpEntitlementChecker {
    async fn has_entitlement(
        &self,
        identity: &Identity,
        level: EntitlementLevel,
    ) -> Result<bool, EntitlementError> {
        let record = match self.fetch_record(&identity.subject).await {
            Ok(record) => record,
            Err(e) => {
                warn!(subject = %identity, error = %e, "entitlement lookup failed");
                return Err(e);
            }
        };

        let granted = match record {
            Some(record) if record.subject == identity.subject => {
                record.grants(level, Utc::now())
            }
            Some(record) => {
                return Err(EntitlementError::Malformed(format!(
                    "record for {} returned for {}",
                    record.subject, identity.subject
                )));
            }
            None => false,
        };
        debug!(subject = %identity, %level, granted, "entitlement resolved");
        Ok(granted)
    }
}
