//! Google Custom Search backend
//!
//! See: https://developers.google.com/custom-search/v1/reference/rest/v1/cse/list

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::SearchProvider;
use crate::error::BackendError;
use crate::types::{ProviderKind, SearchResult};

/// The API refuses `num` above this
pub const MAX_RESULTS_PER_CALL: usize = 10;

/// Google Custom Search backend
pub struct GoogleBackend {
    client: Client,
    endpoint: Url,
    api_key: String,
    engine_id: String,
}

impl GoogleBackend {
    pub fn new(
        client: Client,
        endpoint: Url,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchProvider for GoogleBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResult>, BackendError> {
        let num = count.clamp(1, MAX_RESULTS_PER_CALL).to_string();

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::status(status, &body));
        }

        let parsed: GoogleResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .items
            .into_iter()
            .take(count)
            .map(|item| SearchResult::new(item.link, item.title, item.snippet))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> GoogleBackend {
        let endpoint = Url::parse(&format!("{}/customsearch/v1", server.uri())).unwrap();
        GoogleBackend::new(Client::new(), endpoint, "test-key", "test-cx")
    }

    #[tokio::test]
    async fn test_google_search_returns_results() {
        let mock_server = MockServer::start().await;

        let response_json = r#"{
            "items": [
                {"link": "https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html", "title": "What is Ownership?", "snippet": "Ownership is a set of rules"},
                {"link": "https://example.com/2", "title": "Result 2", "snippet": "Description 2"}
            ]
        }"#;

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("key", "test-key"))
            .and(query_param("cx", "test-cx"))
            .and(query_param("q", "rust ownership"))
            .and(query_param("num", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_json))
            .expect(1)
            .mount(&mock_server)
            .await;

        let results = backend(&mock_server).search("rust ownership", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "What is Ownership?");
        assert_eq!(results[0].snippet, "Ownership is a set of rules");
        assert_eq!(results[1].link, "https://example.com/2");
    }

    #[tokio::test]
    async fn test_google_clamps_num_to_api_maximum() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("num", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"items": []}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let results = backend(&mock_server).search("query", 50).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_google_missing_fields_default_to_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"items": [{"link": "https://example.com"}]}"#),
            )
            .mount(&mock_server)
            .await;

        let results = backend(&mock_server).search("query", 5).await.unwrap();
        assert_eq!(
            results,
            vec![SearchResult::new("https://example.com", "", "")]
        );
    }

    #[tokio::test]
    async fn test_google_no_items_is_empty_not_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"searchInformation": {"totalResults": "0"}}"#),
            )
            .mount(&mock_server)
            .await;

        let results = backend(&mock_server).search("query", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_google_truncates_to_requested_count() {
        let mock_server = MockServer::start().await;

        let response_json = r#"{
            "items": [
                {"link": "https://example.com/1"},
                {"link": "https://example.com/2"},
                {"link": "https://example.com/3"}
            ]
        }"#;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_json))
            .mount(&mock_server)
            .await;

        let results = backend(&mock_server).search("query", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_google_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"error": {"code": 403, "message": "quota exceeded"}}"#),
            )
            .mount(&mock_server)
            .await;

        let err = backend(&mock_server).search("query", 5).await.unwrap_err();
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status.as_u16(), 403);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_google_malformed_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let err = backend(&mock_server).search("query", 5).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }
}
