use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

/// Environment overrides for values that should not live in YAML.
pub const ENV_UPSTREAM_BASE_URL: &str = "UPSTREAM_BASE_URL";
pub const ENV_UPSTREAM_API_KEY: &str = "UPSTREAM_API_KEY";
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";

/// Startup-time configuration failure. Never recovered from.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Misconfigured: {0}")]
    Misconfigured(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub entitlement: EntitlementConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Route prefix for forwarded operations, e.g. `/api/trading`
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "/api/trading".to_string()
}

/// Upstream trading service. Both fields are required at startup.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeoutConfig {
    pub identity_ms: u64,
    pub entitlement_ms: u64,
    pub upstream_ms: u64,
    pub connect_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            identity_ms: 2_000,
            entitlement_ms: 3_000,
            upstream_ms: 30_000,
            connect_ms: 5_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EntitlementConfig {
    pub provider: EntitlementProvider,
    #[serde(default)]
    pub cache: Option<EntitlementCacheConfig>,
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            provider: EntitlementProvider::Static {
                subscribers: Vec::new(),
            },
            cache: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntitlementProvider {
    /// Account service REST API
    Http {
        url: String,
        #[serde(default)]
        api_key: Option<String>,
    },
    /// Fixed subscriber list (local development)
    Static {
        #[serde(default)]
        subscribers: Vec<String>,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EntitlementCacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

/// Everything the gateway needs that must be present before serving.
#[derive(Debug, Clone)]
pub struct ResolvedSecrets {
    pub upstream_base_url: Url,
    pub upstream_api_key: String,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config: AppConfig = serde_yaml::from_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Environment wins over YAML for endpoints and secrets.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_UPSTREAM_BASE_URL) {
            self.upstream.base_url = Some(url);
        }
        if let Some(key) = lookup(ENV_UPSTREAM_API_KEY) {
            self.upstream.api_key = Some(key);
        }
        if let Some(secret) = lookup(ENV_JWT_SECRET) {
            self.auth.jwt_secret = Some(secret);
        }
    }

    /// Check required values; any gap is fatal.
    pub fn resolve_secrets(&self) -> Result<ResolvedSecrets, ConfigError> {
        let base_url = required(&self.upstream.base_url, "upstream.base_url")?;
        let upstream_base_url = Url::parse(base_url).map_err(|e| {
            ConfigError::Misconfigured(format!("upstream.base_url is not a valid URL: {}", e))
        })?;
        if !matches!(upstream_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Misconfigured(format!(
                "upstream.base_url must be http(s), got {}",
                upstream_base_url.scheme()
            )));
        }

        let upstream_api_key = required(&self.upstream.api_key, "upstream.api_key")?.to_string();
        let jwt_secret = required(&self.auth.jwt_secret, "auth.jwt_secret")?.to_string();

        Ok(ResolvedSecrets {
            upstream_base_url,
            upstream_api_key,
            jwt_secret,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

impl TimeoutConfig {
    pub fn identity(&self) -> Duration {
        Duration::from_millis(self.identity_ms)
    }

    pub fn entitlement(&self) -> Duration {
        Duration::from_millis(self.entitlement_ms)
    }

    pub fn upstream(&self) -> Duration {
        Duration::from_millis(self.upstream_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Misconfigured(format!("{} is not set", name))),
    }
}
