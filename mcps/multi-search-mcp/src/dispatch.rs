//! Request dispatch across providers
//!
//! Every request shuffles the current provider set and walks it in that order
//! until one provider returns a non-empty result list. Empty answers and
//! provider errors both move on to the next provider. Nothing is carried
//! between requests: a provider that failed last time is tried again.

use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;

use crate::backends::SearchProvider;
use crate::config::Config;
use crate::error::{BackendError, SearchError};
use crate::format::{format_results, no_results_message, truncate_all};
use crate::registry::{require_providers, ProviderSource};
use crate::types::SearchResult;

pub struct Dispatcher {
    source: Arc<dyn ProviderSource>,
    max_snippet_length: usize,
    provider_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn ProviderSource>,
        max_snippet_length: usize,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            source,
            max_snippet_length,
            provider_timeout,
        }
    }

    pub fn from_config(config: &Config, source: Arc<dyn ProviderSource>) -> Self {
        Self::new(
            source,
            config.search.max_snippet_length,
            config.provider_timeout(),
        )
    }

    pub fn source(&self) -> &Arc<dyn ProviderSource> {
        &self.source
    }

    pub fn max_snippet_length(&self) -> usize {
        self.max_snippet_length
    }

    pub fn provider_timeout(&self) -> Duration {
        self.provider_timeout
    }

    /// Search `query` and render the first non-empty answer as text
    ///
    /// Fails only with [`SearchError::NoProvidersConfigured`], before any
    /// provider is called. Exhausting all providers is a normal reply.
    pub async fn handle(&self, query: &str, count: usize) -> Result<String, SearchError> {
        tracing::info!("Searching web for: {}", query);

        let mut providers = require_providers(self.source.providers())?;
        providers.shuffle(&mut rand::thread_rng());

        let total = providers.len();
        let mut failures = 0;

        for (attempt, provider) in (1..).zip(providers.iter()) {
            let kind = provider.kind();
            tracing::info!("Attempt {}: Using {} search engine", attempt, kind);

            match self.search_one(provider.as_ref(), query, count).await {
                Ok(mut results) if !results.is_empty() => {
                    tracing::info!(
                        "Successfully found {} results using {}",
                        results.len(),
                        kind
                    );
                    truncate_all(&mut results, self.max_snippet_length);
                    return Ok(format_results(&results, query, Some(kind.label())));
                }
                Ok(_) => {
                    tracing::warn!("No results returned from {}, trying next engine...", kind);
                }
                Err(source) => {
                    failures += 1;
                    let err = SearchError::Backend {
                        provider: kind,
                        source,
                    };
                    tracing::error!("{}", err);
                    if attempt < total {
                        tracing::info!("Trying next available search engine...");
                    }
                }
            }
        }

        if failures == total {
            tracing::error!("All {} search engines failed for query: {}", total, query);
        } else {
            tracing::info!(
                "No results for query: {} ({} empty, {} failed)",
                query,
                total - failures,
                failures
            );
        }

        Ok(no_results_message(query))
    }

    async fn search_one(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
        count: usize,
    ) -> Result<Vec<SearchResult>, BackendError> {
        // Dropping the search future on expiry cancels the in-flight call
        tokio::time::timeout(self.provider_timeout, provider.search(query, count))
            .await
            .unwrap_or_else(|_| Err(BackendError::Timeout(self.provider_timeout)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SelectionMode;
    use crate::registry::{Provider, StaticRegistry};
    use crate::types::ProviderKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    pub(crate) enum Outcome {
        Results(Vec<SearchResult>),
        Fail,
        Hang,
    }

    /// Provider stub that records how often it was called
    pub(crate) struct SpyProvider {
        kind: ProviderKind,
        outcome: Outcome,
        calls: AtomicUsize,
    }

    impl SpyProvider {
        pub(crate) fn new(kind: ProviderKind, outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                kind,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn returning(kind: ProviderKind, n: usize) -> Arc<Self> {
            let results = (1..=n)
                .map(|i| {
                    SearchResult::new(
                        format!("https://{}.example/{}", kind.as_str(), i),
                        format!("{} result {}", kind.label(), i),
                        format!("snippet {}", i),
                    )
                })
                .collect();
            Self::new(kind, Outcome::Results(results))
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchProvider for SpyProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn search(
            &self,
            _query: &str,
            count: usize,
        ) -> Result<Vec<SearchResult>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Results(results) => Ok(results.iter().take(count).cloned().collect()),
                Outcome::Fail => Err(BackendError::status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    "boom",
                )),
                Outcome::Hang => {
                    std::future::pending::<()>().await;
                    Ok(Vec::new())
                }
            }
        }
    }

    /// Source that counts how often the registry was consulted
    struct CountingSource {
        inner: StaticRegistry,
        lookups: AtomicUsize,
    }

    impl ProviderSource for CountingSource {
        fn providers(&self) -> Vec<Provider> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.providers()
        }

        fn mode(&self) -> SelectionMode {
            self.inner.mode()
        }
    }

    pub(crate) fn provider(spy: &Arc<SpyProvider>) -> Provider {
        spy.clone()
    }

    fn dispatcher(providers: Vec<Provider>) -> Dispatcher {
        Dispatcher::new(
            Arc::new(StaticRegistry::new(providers)),
            512,
            Duration::from_secs(5),
        )
    }

    fn entry_count(text: &str) -> usize {
        text.lines().filter(|l| l.contains(". **")).count()
    }

    #[tokio::test]
    async fn test_empty_registry_is_error_after_one_lookup() {
        let source = Arc::new(CountingSource {
            inner: StaticRegistry::new(Vec::new()),
            lookups: AtomicUsize::new(0),
        });
        let dispatcher = Dispatcher::new(source.clone(), 512, Duration::from_secs(5));

        let err = dispatcher.handle("anything", 10).await.unwrap_err();

        assert!(matches!(err, SearchError::NoProvidersConfigured));
        assert_eq!(source.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_first_provider_falls_through() {
        for _ in 0..16 {
            let empty = SpyProvider::new(ProviderKind::Google, Outcome::Results(Vec::new()));
            let full = SpyProvider::returning(ProviderKind::Ollama, 3);
            let dispatcher = dispatcher(vec![provider(&empty), provider(&full)]);

            let text = dispatcher.handle("q", 10).await.unwrap();

            assert!(text.contains("(via Ollama)"));
            assert_eq!(entry_count(&text), 3);
            assert_eq!(full.calls(), 1);
            assert!(empty.calls() <= 1);
        }
    }

    #[tokio::test]
    async fn test_failing_provider_is_not_surfaced() {
        for _ in 0..16 {
            let broken = SpyProvider::new(ProviderKind::Google, Outcome::Fail);
            let working = SpyProvider::returning(ProviderKind::Ollama, 2);
            let dispatcher = dispatcher(vec![provider(&broken), provider(&working)]);

            let text = dispatcher.handle("q", 10).await.unwrap();

            assert_eq!(entry_count(&text), 2);
            assert!(text.contains("Ollama result 2"));
            assert!(!text.contains("boom"));
        }
    }

    #[tokio::test]
    async fn test_all_empty_yields_no_results_message() {
        let a = SpyProvider::new(ProviderKind::Google, Outcome::Results(Vec::new()));
        let b = SpyProvider::new(ProviderKind::Ollama, Outcome::Results(Vec::new()));
        let dispatcher = dispatcher(vec![provider(&a), provider(&b)]);

        let text = dispatcher.handle("obscure", 10).await.unwrap();

        assert_eq!(text, no_results_message("obscure"));
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_failing_yields_no_results_message() {
        let a = SpyProvider::new(ProviderKind::Google, Outcome::Fail);
        let b = SpyProvider::new(ProviderKind::Ollama, Outcome::Fail);
        let dispatcher = dispatcher(vec![provider(&a), provider(&b)]);

        let text = dispatcher.handle("q", 10).await.unwrap();
        assert!(text.starts_with("No results found for query: q"));
    }

    #[tokio::test]
    async fn test_hanging_provider_times_out_and_falls_through() {
        let stuck = SpyProvider::new(ProviderKind::Ollama, Outcome::Hang);
        let working = SpyProvider::returning(ProviderKind::Google, 1);
        let dispatcher = Dispatcher::new(
            Arc::new(StaticRegistry::new(vec![provider(&stuck), provider(&working)])),
            512,
            Duration::from_millis(50),
        );

        let text = dispatcher.handle("q", 10).await.unwrap();
        assert!(text.contains("(via Google)"));
    }

    #[tokio::test]
    async fn test_snippets_truncated_in_output() {
        let long = SpyProvider::new(
            ProviderKind::Google,
            Outcome::Results(vec![SearchResult::new(
                "https://example.com",
                "Long",
                "x".repeat(100),
            )]),
        );
        let dispatcher = Dispatcher::new(
            Arc::new(StaticRegistry::new(vec![provider(&long)])),
            20,
            Duration::from_secs(5),
        );

        let text = dispatcher.handle("q", 10).await.unwrap();
        let expected = format!("   {}...\n", "x".repeat(17));
        assert!(text.contains(&expected));
    }

    #[tokio::test]
    async fn test_shuffle_varies_provider_order() {
        let google = SpyProvider::returning(ProviderKind::Google, 1);
        let ollama = SpyProvider::returning(ProviderKind::Ollama, 1);
        let dispatcher = dispatcher(vec![provider(&google), provider(&ollama)]);

        for _ in 0..64 {
            dispatcher.handle("q", 10).await.unwrap();
        }

        // Each request stops at the first provider, so both being picked
        // means the order is not fixed.
        assert_eq!(google.calls() + ollama.calls(), 64);
        assert!(google.calls() > 0);
        assert!(ollama.calls() > 0);
    }

    #[tokio::test]
    async fn test_count_is_passed_to_provider() {
        let spy = SpyProvider::returning(ProviderKind::Google, 10);
        let dispatcher = dispatcher(vec![provider(&spy)]);

        let text = dispatcher.handle("q", 4).await.unwrap();
        assert_eq!(entry_count(&text), 4);
    }
}
