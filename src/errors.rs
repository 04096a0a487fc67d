use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

pub const ERR_NOT_FOUND: &str = "not_found";
pub const ERR_BAD_REQUEST: &str = "bad_request";
pub const ERR_RATE_LIMITED: &str = "rate_limited";
pub const ERR_SERVER: &str = "server_error";
pub const ERR_HTTP: &str = "http_error";

/// Generic message used when the registry returns a non-2xx response
/// without a body.
pub const API_REQUEST_FAILED: &str = "API request failed";

// ---------------------------------------------------------------------------
// Main SDK error type
// ---------------------------------------------------------------------------

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry answered with a non-2xx status.
    #[error("{0}")]
    Api(Box<ApiError>),

    /// Network failure: the request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Builder misconfiguration.
    #[error("builder error: {0}")]
    Builder(String),

    /// Invalid environment configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The transport cannot perform the operation, e.g. binary downloads
    /// from an in-memory registry.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl RegistryError {
    /// HTTP status carried by the error, if the registry responded at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            RegistryError::Api(err) => Some(err.http_status),
            _ => None,
        }
    }

    /// Whether a manual or automatic retry can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RegistryError::Api(err) => err.is_retryable(),
            RegistryError::Transport(_) => true,
            _ => false,
        }
    }

    /// Returns `true` for a 404 from the registry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::Api(err) if err.is_not_found())
    }
}

impl From<ApiError> for RegistryError {
    fn from(err: ApiError) -> Self {
        RegistryError::Api(Box::new(err))
    }
}

#[cfg(feature = "reqwest-transport")]
impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for RegistryError {
    fn from(err: serde_yaml::Error) -> Self {
        RegistryError::Serialization(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// API error (non-2xx response from the registry)
// ---------------------------------------------------------------------------

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub retryable: bool,
    #[serde(skip)]
    pub http_status: u16,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.http_status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>, http_status: u16) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable: false,
            http_status,
        }
    }

    /// Build an error from a raw status and response body.
    ///
    /// The registry answers failures with a plain-text body, so the body is
    /// used verbatim as the message when present.
    pub fn from_status(http_status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).trim().to_string();
        let message = if text.is_empty() {
            API_REQUEST_FAILED.to_string()
        } else {
            text
        };
        Self::new(code_for_status(http_status), message, http_status)
            .retryable(http_status == 429 || http_status >= 500)
    }

    /// Set whether this error is retryable.
    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_not_found(&self) -> bool {
        self.http_status == 404
    }
}

fn code_for_status(status: u16) -> &'static str {
    match status {
        400 => ERR_BAD_REQUEST,
        404 => ERR_NOT_FOUND,
        429 => ERR_RATE_LIMITED,
        s if s >= 500 => ERR_SERVER,
        _ => ERR_HTTP,
    }
}

// ---------------------------------------------------------------------------
// Result type alias
// ---------------------------------------------------------------------------

pub type Result<T> = std::result::Result<T, RegistryError>;
