//! Ollama web search backend
//!
//! Talks to `POST /api/web_search` on either the hosted service (bearer key)
//! or a local instance (no key). Each call runs on its own spawned task,
//! gated by a shared semaphore, so a slow local search never stalls the
//! caller's task and concurrency against the instance stays bounded.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use url::Url;

use super::SearchProvider;
use crate::error::{BackendError, ConfigError};
use crate::types::{ProviderKind, SearchResult};

const WEB_SEARCH_PATH: &str = "api/web_search";

/// Ollama web search backend
pub struct OllamaBackend {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    workers: Arc<Semaphore>,
}

impl OllamaBackend {
    /// `workers` is shared between backend instances so the bound holds even
    /// though the registry rebuilds providers per request.
    pub fn new(
        client: Client,
        base_url: Url,
        api_key: Option<String>,
        workers: Arc<Semaphore>,
    ) -> Result<Self, ConfigError> {
        let mut base = base_url;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(WEB_SEARCH_PATH)
            .map_err(|source| ConfigError::InvalidUrl {
                url: base.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            workers,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request(&self, query: &str, count: usize) -> RequestBuilder {
        let request = self
            .client
            .post(self.endpoint.clone())
            .json(&WebSearchRequest {
                query,
                max_results: count,
            });

        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[derive(Debug, Serialize)]
struct WebSearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct WebSearchResponse {
    #[serde(default)]
    results: Vec<WebSearchItem>,
}

#[derive(Debug, Deserialize)]
struct WebSearchItem {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Join handle that aborts its task when dropped unfinished
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[async_trait]
impl SearchProvider for OllamaBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResult>, BackendError> {
        let request = self.request(query, count);
        let workers = Arc::clone(&self.workers);

        let task = tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only waits.
            let _permit = workers.acquire_owned().await.ok();
            execute(request, count).await
        });

        AbortOnDrop(task).await?
    }
}

async fn execute(request: RequestBuilder, count: usize) -> Result<Vec<SearchResult>, BackendError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(BackendError::status(status, &body));
    }

    let parsed: WebSearchResponse = serde_json::from_str(&body)?;
    Ok(parsed
        .results
        .into_iter()
        .take(count)
        .map(|item| SearchResult::new(item.url, item.title, item.content))
        .collect())
}
