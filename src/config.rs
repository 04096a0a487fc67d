use std::collections::HashMap;
use std::time::Duration;

use crate::errors::RegistryError;

/// Base URL used by a development build, where the console and the registry
/// run as separate processes.
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8080";

/// Base URL used in production: requests go to the serving origin.
pub const PRODUCTION_BASE_URL: &str = "";

pub const ENV_BASE_URL: &str = "TALLYCAT_API_BASE_URL";
pub const ENV_ENVIRONMENT: &str = "TALLYCAT_ENV";
pub const ENV_AUTH_TOKEN: &str = "TALLYCAT_AUTH_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "TALLYCAT_TIMEOUT_SECS";

/// Deployment environment the client runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    /// Default registry base URL for this environment.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Development => DEVELOPMENT_BASE_URL,
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(RegistryError::Config(format!(
                "unknown environment: {}",
                other
            ))),
        }
    }
}

/// Connection settings for a registry [`Client`](crate::Client).
///
/// # Example
///
/// ```rust
/// use tallycat::{ConnectionConfig, Environment};
///
/// let config = ConnectionConfig::for_environment(Environment::Development)
///     .auth_token("my-token")
///     .header("X-Tenant-Id", "tenant-42")
///     .timeout(std::time::Duration::from_secs(10));
///
/// assert_eq!(config.base_url, "http://localhost:8080");
///
/// let client = tallycat::Client::builder()
///     .connection(config)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Registry base URL. Empty means "same origin".
    pub base_url: String,
    /// Authentication bearer token.
    pub auth_token: Option<String>,
    /// Custom HTTP headers.
    pub headers: HashMap<String, String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl ConnectionConfig {
    /// Create a new connection config with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Create a config using the default base URL of `env`.
    pub fn for_environment(env: Environment) -> Self {
        Self::new(env.default_base_url())
    }

    /// Load settings from `TALLYCAT_*` environment variables.
    ///
    /// `TALLYCAT_API_BASE_URL` wins over the environment default picked by
    /// `TALLYCAT_ENV`.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup(ENV_ENVIRONMENT) {
            Some(value) => value.parse::<Environment>()?,
            None => Environment::default(),
        };

        let mut config = match lookup(ENV_BASE_URL) {
            Some(url) => Self::new(url),
            None => Self::for_environment(env),
        };

        if let Some(token) = lookup(ENV_AUTH_TOKEN).filter(|t| !t.is_empty()) {
            config.auth_token = Some(token);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                RegistryError::Config(format!("{} must be an integer: {}", ENV_TIMEOUT_SECS, raw))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        tracing::debug!(
            base_url = %config.base_url,
            environment = ?env,
            "loaded registry connection config"
        );

        Ok(config)
    }

    /// Set the authentication bearer token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Add a custom HTTP header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
