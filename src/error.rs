// src/error.rs

//! Unified error handling for the scan pipeline.
//!
//! Two shapes live here:
//! - [`AppError`]: failures of the application itself (I/O, config, HTTP plumbing).
//! - [`ScraperError`]: a classified page-fetch failure carrying a retry decision.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Boxed cause attached to a classified fetch failure.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Language model capability failed or is misconfigured
    #[error("LLM error: {0}")]
    Llm(String),

    /// Classified page-fetch failure
    #[error(transparent)]
    Scraper(#[from] ScraperError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an LLM capability error.
    pub fn llm(message: impl fmt::Display) -> Self {
        Self::Llm(message.to_string())
    }
}

/// Fixed taxonomy of page-fetch failures.
///
/// Retryability is read off the identifier prefix, see [`ScraperErrorKind::is_retryable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScraperErrorKind {
    RetryableTimeout,
    RetryableNetwork,
    RetryableRateLimit,
    RetryableServerError,
    PermanentNotFound,
    PermanentForbidden,
    PermanentBadRequest,
    PermanentInvalidUrl,
    PermanentUnsupported,
}

impl ScraperErrorKind {
    /// Stable identifier, e.g. `RETRYABLE_TIMEOUT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetryableTimeout => "RETRYABLE_TIMEOUT",
            Self::RetryableNetwork => "RETRYABLE_NETWORK",
            Self::RetryableRateLimit => "RETRYABLE_RATE_LIMIT",
            Self::RetryableServerError => "RETRYABLE_SERVER_ERROR",
            Self::PermanentNotFound => "PERMANENT_NOT_FOUND",
            Self::PermanentForbidden => "PERMANENT_FORBIDDEN",
            Self::PermanentBadRequest => "PERMANENT_BAD_REQUEST",
            Self::PermanentInvalidUrl => "PERMANENT_INVALID_URL",
            Self::PermanentUnsupported => "PERMANENT_UNSUPPORTED",
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.as_str().starts_with("RETRYABLE_")
    }
}

impl fmt::Display for ScraperErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure for a single URL.
#[derive(Error, Debug)]
#[error("{kind} for {url}: {message}")]
pub struct ScraperError {
    pub message: String,
    pub kind: ScraperErrorKind,
    pub url: String,
    #[source]
    pub original_error: Option<BoxedCause>,
}

impl ScraperError {
    pub fn new(kind: ScraperErrorKind, message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            url: url.into(),
            original_error: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_cause(mut self, cause: BoxedCause) -> Self {
        self.original_error = Some(cause);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
