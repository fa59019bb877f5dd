//! Error types for provider operations.
//!
//! This module defines [`ProviderError`], the typed failure every provider
//! returns instead of panicking, and [`ErrorKind`], the coarse taxonomy the
//! aggregation layer records per source.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while fetching from a provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded, either by the local budget or by the provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The requested symbol or company is unknown to the provider.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error parsing a provider payload.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider answered with a non-success status or reported a failure.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The provider is missing the configuration it needs (usually an API key).
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ProviderError {
    /// Returns the taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkError,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::Upstream(_) | Self::InvalidParameter(_) => ErrorKind::UpstreamError,
            Self::NotConfigured(_) => ErrorKind::Unconfigured,
        }
    }
}

/// Coarse classification of a provider failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Denied by the local budget or throttled by the provider.
    RateLimited,
    /// Timeout or connection failure.
    NetworkError,
    /// Malformed upstream payload.
    ParseError,
    /// Symbol or company unknown to the provider.
    NotFound,
    /// Non-2xx response or provider-reported failure.
    UpstreamError,
    /// The provider is disabled for lack of configuration.
    Unconfigured,
}

/// Result type alias using [`ProviderError`].
pub type Result<T> = std::result::Result<T, ProviderError>;
