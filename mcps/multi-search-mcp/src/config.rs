//! Configuration loading for multi-search-mcp
//!
//! Settings are layered, highest priority first:
//! 1. Environment variables (`MAX_SNIPPET_LENGTH`, `SEARCH_PROVIDER`, ...)
//! 2. TOML file at `WEB_SEARCH_CONFIG_PATH`, or `~/.binks/web-search.toml`
//! 3. Default values
//!
//! Provider credentials are deliberately absent from [`Config`]: they are read
//! from the environment on every request by the registry so that rotated keys
//! apply without a restart.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::types::ProviderKind;

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const GOOGLE_SEARCH_ENGINE_ID: &str = "GOOGLE_SEARCH_ENGINE_ID";
pub const OLLAMA_API_KEY: &str = "OLLAMA_API_KEY";
pub const OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const OLLAMA_MAX_CONCURRENT: &str = "OLLAMA_MAX_CONCURRENT";
pub const MAX_SNIPPET_LENGTH: &str = "MAX_SNIPPET_LENGTH";
pub const PROVIDER_TIMEOUT_SECS: &str = "PROVIDER_TIMEOUT_SECS";
pub const SEARCH_PROVIDER: &str = "SEARCH_PROVIDER";
pub const CONFIG_PATH: &str = "WEB_SEARCH_CONFIG_PATH";
pub const MCP_TRANSPORT: &str = "MCP_TRANSPORT";
pub const MCP_BIND_ADDR: &str = "MCP_BIND_ADDR";

pub const DEFAULT_MAX_SNIPPET_LENGTH: usize = 512;
pub const DEFAULT_GOOGLE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_OLLAMA_LOCAL_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_CLOUD_HOST: &str = "https://ollama.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Key/value lookup for environment-style configuration
///
/// The process environment in production, a `HashMap` in tests.
pub trait Env: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    /// Value of `key`, trimmed, or `None` if unset or blank
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Reads from the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// How providers are chosen per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Detect all usable providers each request, shuffle, fall back in order
    Random,
    /// Always use one provider, no shuffle and no fallback
    Fixed(ProviderKind),
}

/// How the MCP server is exposed to clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    /// Streamable HTTP, for clients such as OpenWebUI
    Http,
}

impl Transport {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stdio" => Some(Self::Stdio),
            "http" | "streamable-http" => Some(Self::Http),
            _ => None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Transport configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Dispatch and formatting configuration
    #[serde(default)]
    pub search: SearchConfig,
    /// Google Custom Search configuration
    #[serde(default)]
    pub google: GoogleConfig,
    /// Ollama web search configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub transport: Transport,
    /// Listen address for the HTTP transport
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// General search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result count used when the caller does not pass one
    #[serde(default = "default_count")]
    pub default_count: usize,
    /// Snippets longer than this are truncated with "..." (0 disables)
    #[serde(default = "default_max_snippet_length")]
    pub max_snippet_length: usize,
    /// Per-provider call timeout
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
    /// Fixed provider ("google" or "ollama"); unset means random with fallback
    #[serde(default)]
    pub provider: Option<String>,
}

/// Google Custom Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Custom Search JSON API endpoint
    #[serde(default = "default_google_endpoint")]
    pub endpoint: String,
}

/// Ollama web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL; defaults depend on whether an API key is present
    #[serde(default)]
    pub host: Option<String>,
    /// Maximum concurrent in-flight Ollama searches
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_count() -> usize {
    10
}

fn default_max_snippet_length() -> usize {
    DEFAULT_MAX_SNIPPET_LENGTH
}

fn default_provider_timeout() -> u64 {
    10
}

fn default_google_endpoint() -> String {
    DEFAULT_GOOGLE_ENDPOINT.to_string()
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_snippet_length: default_max_snippet_length(),
            provider_timeout_secs: default_provider_timeout(),
            provider: None,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_google_endpoint(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: None,
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl Config {
    /// Load configuration from file and process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(&ProcessEnv)
    }

    /// Load configuration using `env` for both the file lookup and overrides
    pub fn load_with(env: &dyn Env) -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_path(env) {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from: {}", path.display());
                let content = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Read {
                        path: path.display().to_string(),
                        source,
                    }
                })?;
                Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?
            }
            Some(_) => {
                tracing::info!("Config file not found, using defaults");
                Self::default()
            }
            None => {
                tracing::info!("No config path specified, using defaults");
                Self::default()
            }
        };

        config.apply_env(env);
        config.validate();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlay environment variables onto file/default values
    pub fn apply_env(&mut self, env: &dyn Env) {
        if let Some(raw) = env.non_empty(MCP_TRANSPORT) {
            match Transport::parse(&raw) {
                Some(transport) => self.server.transport = transport,
                None => tracing::warn!(
                    "Invalid {} value '{}' (expected 'stdio' or 'http'), keeping {:?}",
                    MCP_TRANSPORT,
                    raw,
                    self.server.transport
                ),
            }
        }

        if let Some(addr) = env.non_empty(MCP_BIND_ADDR) {
            self.server.bind_addr = addr;
        }

        if let Some(raw) = env.var(MAX_SNIPPET_LENGTH) {
            self.search.max_snippet_length = parse_max_snippet_length(&raw);
        }

        if let Some(raw) = env.non_empty(PROVIDER_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => self.search.provider_timeout_secs = secs,
                _ => {
                    tracing::warn!(
                        "Invalid {} value '{}', using default of {}",
                        PROVIDER_TIMEOUT_SECS,
                        raw,
                        default_provider_timeout()
                    );
                    self.search.provider_timeout_secs = default_provider_timeout();
                }
            }
        }

        if let Some(provider) = env.non_empty(SEARCH_PROVIDER) {
            self.search.provider = Some(provider);
        }

        if let Some(host) = env.non_empty(OLLAMA_HOST) {
            self.ollama.host = Some(host);
        }

        if let Some(raw) = env.non_empty(OLLAMA_MAX_CONCURRENT) {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.ollama.max_concurrent = n,
                _ => tracing::warn!(
                    "Invalid {} value '{}', keeping {}",
                    OLLAMA_MAX_CONCURRENT,
                    raw,
                    self.ollama.max_concurrent
                ),
            }
        }
    }

    /// Replace values that cannot work with their defaults
    fn validate(&mut self) {
        if matches!(self.search.max_snippet_length, 1 | 2) {
            tracing::warn!(
                "max_snippet_length {} is too short for an ellipsis, using default of {}",
                self.search.max_snippet_length,
                DEFAULT_MAX_SNIPPET_LENGTH
            );
            self.search.max_snippet_length = DEFAULT_MAX_SNIPPET_LENGTH;
        }
        if self.search.provider_timeout_secs == 0 {
            self.search.provider_timeout_secs = default_provider_timeout();
        }
        if self.search.default_count == 0 {
            self.search.default_count = default_count();
        }
        if self.ollama.max_concurrent == 0 {
            self.ollama.max_concurrent = default_max_concurrent();
        }
    }

    pub fn selection_mode(&self) -> Result<SelectionMode, ConfigError> {
        match self.search.provider.as_deref().map(str::trim) {
            None | Some("") => Ok(SelectionMode::Random),
            Some(raw) => ProviderKind::parse(raw)
                .map(SelectionMode::Fixed)
                .ok_or_else(|| ConfigError::UnknownProvider(raw.to_string())),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                addr: self.server.bind_addr.clone(),
                source,
            })
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.search.provider_timeout_secs)
    }

    pub fn google_endpoint(&self) -> Result<Url, ConfigError> {
        parse_url(&self.google.endpoint)
    }

    /// Ollama base URL: configured host, else hosted service when a key is
    /// present, else a local instance
    pub fn ollama_base_url(&self, has_api_key: bool) -> Result<Url, ConfigError> {
        let host = match (&self.ollama.host, has_api_key) {
            (Some(host), _) => host.as_str(),
            (None, true) => DEFAULT_OLLAMA_CLOUD_HOST,
            (None, false) => DEFAULT_OLLAMA_LOCAL_HOST,
        };
        parse_url(host)
    }

    fn find_config_path(env: &dyn Env) -> Option<PathBuf> {
        if let Some(path) = env.non_empty(CONFIG_PATH) {
            return Some(PathBuf::from(path));
        }

        env.non_empty("HOME")
            .map(|home| PathBuf::from(home).join(".binks").join("web-search.toml"))
    }
}

/// Parse `MAX_SNIPPET_LENGTH`, falling back to the default on bad input
pub fn parse_max_snippet_length(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(len) => len,
        Err(_) => {
            tracing::warn!(
                "Invalid {} value '{}', using default of {}",
                MAX_SNIPPET_LENGTH,
                raw,
                DEFAULT_MAX_SNIPPET_LENGTH
            );
            DEFAULT_MAX_SNIPPET_LENGTH
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
