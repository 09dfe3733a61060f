//! Error types for search dispatch
//!
//! Only [`SearchError::NoProvidersConfigured`] ever leaves the dispatcher.
//! Backend failures are logged and trigger fallback to the next provider.

use std::time::Duration;
use thiserror::Error;

use crate::types::ProviderKind;

/// Number of response-body characters kept in status errors
const BODY_PREVIEW_CHARS: usize = 200;

/// Failure of a single provider call
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport-level failure (connect, TLS, reset, ...)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body was not the JSON shape we expect
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The call exceeded the per-provider timeout and was cancelled
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The off-loaded worker task panicked or was cancelled
    #[error("search worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl BackendError {
    /// Build a status error, keeping only a short preview of the body
    pub fn status(status: reqwest::StatusCode, body: &str) -> Self {
        Self::Status {
            status,
            body: body.chars().take(BODY_PREVIEW_CHARS).collect(),
        }
    }
}

/// Errors crossing the dispatch boundary
#[derive(Error, Debug)]
pub enum SearchError {
    /// No provider is usable with the current configuration
    #[error(
        "No search engines configured. Please set up at least one of: \
         GOOGLE_API_KEY+GOOGLE_SEARCH_ENGINE_ID or OLLAMA_API_KEY"
    )]
    NoProvidersConfigured,

    /// One provider's call failed
    #[error("{provider} search failed: {source}")]
    Backend {
        provider: ProviderKind,
        #[source]
        source: BackendError,
    },
}

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown search provider '{0}' (expected 'google' or 'ollama')")]
    UnknownProvider(String),

    #[error("search provider '{0}' selected but its credentials are not configured")]
    ProviderUnavailable(ProviderKind),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid bind address '{addr}': {source}")]
    InvalidBindAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
