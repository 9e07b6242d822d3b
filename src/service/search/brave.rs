//! Brave Search API provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{SearchError, SearchProvider, SearchResult, status_error};

const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const PROVIDER: &str = "brave";

/// Brave Search API provider.
pub struct BraveSearchProvider {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl BraveSearchProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, BRAVE_API_URL.to_string())
    }

    /// Point the provider at a different endpoint (proxies, tests).
    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        let client = Client::builder().timeout(Duration::from_secs(10)).build().unwrap_or_default();

        Self { api_key, endpoint, client }
    }
}

#[async_trait]
impl SearchProvider for BraveSearchProvider {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", &num_results.min(20).to_string())])
            .send()
            .await
            .map_err(|source| SearchError::Transport { provider: PROVIDER, source })?;

        if !response.status().is_success() {
            return Err(status_error(PROVIDER, response).await);
        }

        let data: BraveResponse = response.json().await.map_err(|source| SearchError::Transport { provider: PROVIDER, source })?;

        Ok(data
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .take(num_results)
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                snippet: r.description.unwrap_or_default(),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, query_param},
    };

    use super::*;

    #[tokio::test]
    async fn test_brave_search_parses_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("X-Subscription-Token", "brave-key"))
            .and(query_param("q", "acme invoicing"))
            .and(query_param("count", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "web": {
                    "results": [
                        { "title": "Acme", "url": "https://acme.io", "description": "Acme automates invoicing." },
                        { "title": "Acme blog", "url": "https://acme.io/blog" }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let provider = BraveSearchProvider::with_endpoint("brave-key".to_string(), server.uri());
        let results = provider.search("acme invoicing", 3).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet, "Acme automates invoicing.");
        assert_eq!(results[1].snippet, "");
    }

    #[tokio::test]
    async fn test_brave_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(429)).mount(&server).await;

        let provider = BraveSearchProvider::with_endpoint("brave-key".to_string(), server.uri());
        let err = provider.search("acme", 3).await.unwrap_err();

        assert!(matches!(err, SearchError::RateLimited { provider: "brave" }));
    }

    #[test]
    fn test_brave_response_without_web_section() {
        let response: BraveResponse = serde_json::from_str(r#"{"type": "search"}"#).unwrap();

        assert!(response.web.is_none());
    }
}
