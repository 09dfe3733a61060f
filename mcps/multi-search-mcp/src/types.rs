//! Common types for web search results
//!
//! Every backend normalizes its response into [`SearchResult`] so the
//! dispatcher and formatter never see provider-specific shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single normalized web search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The URL of the result
    pub link: String,
    /// The title of the result (empty when the backend omitted it)
    pub title: String,
    /// A description or snippet of the result (empty when omitted)
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        link: impl Into<String>,
        title: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            snippet: snippet.into(),
        }
    }
}

/// Which backend a provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Custom Search JSON API
    Google,
    /// Ollama web search API (hosted or local instance)
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Google, ProviderKind::Ollama];

    /// Human-readable name used for provenance in formatted output
    pub fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Ollama => "Ollama",
        }
    }

    /// Identifier used in configuration (`SEARCH_PROVIDER`)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Ollama => "ollama",
        }
    }

    /// Parse a configuration identifier, case-insensitively
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
