//! Provider availability detection
//!
//! Decides which providers are usable from the credentials present in the
//! environment:
//!
//! | Present                                         | Provider |
//! |-------------------------------------------------|----------|
//! | `GOOGLE_API_KEY` and `GOOGLE_SEARCH_ENGINE_ID`  | Google   |
//! | `OLLAMA_API_KEY`, or nothing (local instance)   | Ollama   |

use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

use crate::backends::{GoogleBackend, OllamaBackend, SearchProvider};
use crate::config::{
    Config, Env, SelectionMode, GOOGLE_API_KEY, GOOGLE_SEARCH_ENGINE_ID, OLLAMA_API_KEY,
};
use crate::error::{ConfigError, SearchError};
use crate::types::ProviderKind;

pub type Provider = Arc<dyn SearchProvider>;

/// Source of the provider set for a request
pub trait ProviderSource: Send + Sync {
    /// Providers usable right now; may be empty
    fn providers(&self) -> Vec<Provider>;

    fn mode(&self) -> SelectionMode;
}

/// Builds provider instances from credentials
///
/// Holds everything that outlives a single request: the HTTP connection pool,
/// validated endpoints and the Ollama worker bound.
#[derive(Clone)]
pub struct ProviderFactory {
    client: Client,
    google_endpoint: Url,
    ollama_local: Url,
    ollama_hosted: Url,
    ollama_workers: Arc<Semaphore>,
}

impl ProviderFactory {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(concat!("multi-search-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: &Config) -> Result<Self, ConfigError> {
        let factory = Self {
            client,
            google_endpoint: config.google_endpoint()?,
            ollama_local: config.ollama_base_url(false)?,
            ollama_hosted: config.ollama_base_url(true)?,
            ollama_workers: Arc::new(Semaphore::new(config.ollama.max_concurrent)),
        };

        // Surface bad Ollama hosts at startup rather than on every request
        factory.ollama(None)?;
        factory.ollama(Some(String::new()))?;

        Ok(factory)
    }

    pub fn google(&self, api_key: &str, engine_id: &str) -> Provider {
        Arc::new(GoogleBackend::new(
            self.client.clone(),
            self.google_endpoint.clone(),
            api_key,
            engine_id,
        ))
    }

    pub fn ollama(&self, api_key: Option<String>) -> Result<Provider, ConfigError> {
        let base = if api_key.is_some() {
            self.ollama_hosted.clone()
        } else {
            self.ollama_local.clone()
        };
        let backend = OllamaBackend::new(
            self.client.clone(),
            base,
            api_key,
            Arc::clone(&self.ollama_workers),
        )?;
        Ok(Arc::new(backend))
    }

    /// Build `kind` if its required configuration is present in `env`
    pub fn build(&self, kind: ProviderKind, env: &dyn Env) -> Option<Provider> {
        match kind {
            ProviderKind::Google => {
                let api_key = env.non_empty(GOOGLE_API_KEY)?;
                let engine_id = env.non_empty(GOOGLE_SEARCH_ENGINE_ID)?;
                Some(self.google(&api_key, &engine_id))
            }
            ProviderKind::Ollama => match self.ollama(env.non_empty(OLLAMA_API_KEY)) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    tracing::error!("Failed to configure Ollama search: {}", e);
                    None
                }
            },
        }
    }
}

/// Every provider whose required configuration is present in `env`
pub fn detect_providers(env: &dyn Env, factory: &ProviderFactory) -> Vec<Provider> {
    ProviderKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let provider = factory.build(kind, env);
            if provider.is_some() {
                tracing::debug!("{} search engine detected and configured", kind);
            }
            provider
        })
        .collect()
}

/// Reject an empty provider set
pub fn require_providers(providers: Vec<Provider>) -> Result<Vec<Provider>, SearchError> {
    if providers.is_empty() {
        Err(SearchError::NoProvidersConfigured)
    } else {
        Ok(providers)
    }
}

/// Re-detects providers from the environment on every request
pub struct EnvRegistry {
    env: Arc<dyn Env>,
    factory: ProviderFactory,
}

impl EnvRegistry {
    pub fn new(env: Arc<dyn Env>, factory: ProviderFactory) -> Self {
        Self { env, factory }
    }
}

impl ProviderSource for EnvRegistry {
    fn providers(&self) -> Vec<Provider> {
        detect_providers(self.env.as_ref(), &self.factory)
    }

    fn mode(&self) -> SelectionMode {
        SelectionMode::Random
    }
}

/// A provider set resolved once and reused for the process lifetime
pub struct StaticRegistry {
    providers: Vec<Provider>,
    mode: SelectionMode,
}

impl StaticRegistry {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self {
            providers,
            mode: SelectionMode::Random,
        }
    }

    /// The single-provider variant selected by `SEARCH_PROVIDER`
    pub fn fixed(
        kind: ProviderKind,
        env: &dyn Env,
        factory: &ProviderFactory,
    ) -> Result<Self, ConfigError> {
        let provider = factory
            .build(kind, env)
            .ok_or(ConfigError::ProviderUnavailable(kind))?;
        Ok(Self {
            providers: vec![provider],
            mode: SelectionMode::Fixed(kind),
        })
    }
}

impl ProviderSource for StaticRegistry {
    fn providers(&self) -> Vec<Provider> {
        self.providers.clone()
    }

    fn mode(&self) -> SelectionMode {
        self.mode
    }
}

/// Build the registry matching the configured selection mode
pub fn build_registry(
    config: &Config,
    env: Arc<dyn Env>,
    factory: ProviderFactory,
) -> Result<Arc<dyn ProviderSource>, ConfigError> {
    match config.selection_mode()? {
        SelectionMode::Random => Ok(Arc::new(EnvRegistry::new(env, factory))),
        SelectionMode::Fixed(kind) => Ok(Arc::new(StaticRegistry::fixed(
            kind,
            env.as_ref(),
            &factory,
        )?)),
    }
}
