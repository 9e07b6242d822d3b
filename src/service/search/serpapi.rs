//! SerpAPI (Google results) provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{SearchError, SearchProvider, SearchResult, status_error};

const SERPAPI_URL: &str = "https://serpapi.com/search.json";
const PROVIDER: &str = "serpapi";

/// SerpAPI provider.
pub struct SerpApiSearchProvider {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl SerpApiSearchProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, SERPAPI_URL.to_string())
    }

    /// Point the provider at a different endpoint (proxies, tests).
    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        let client = Client::builder().timeout(Duration::from_secs(10)).build().unwrap_or_default();

        Self { api_key, endpoint, client }
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearchProvider {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("engine", "google"), ("api_key", &self.api_key), ("q", query), ("num", &num_results.to_string())])
            .send()
            .await
            .map_err(|source| SearchError::Transport { provider: PROVIDER, source })?;

        if !response.status().is_success() {
            return Err(status_error(PROVIDER, response).await);
        }

        let data: SerpApiResponse = response.json().await.map_err(|source| SearchError::Transport { provider: PROVIDER, source })?;

        if let Some(error) = data.error {
            return Err(SearchError::Api {
                provider: PROVIDER,
                status: 200,
                message: error,
            });
        }

        Ok(data
            .organic_results
            .into_iter()
            .take(num_results)
            .map(|r| SearchResult {
                title: r.title,
                url: r.link,
                snippet: r.snippet.unwrap_or_default(),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SerpApiResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpApiResult {
    title: String,
    link: String,
    snippet: Option<String>,
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, query_param},
    };

    use super::*;

    #[tokio::test]
    async fn test_serpapi_search_parses_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("api_key", "serp-key"))
            .and(query_param("q", "acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic_results": [
                    { "title": "Acme", "link": "https://acme.io", "snippet": "Acme is an AP platform." },
                    { "title": "Acme 2", "link": "https://acme.io/2", "snippet": "More." },
                    { "title": "Acme 3", "link": "https://acme.io/3", "snippet": "Even more." }
                ]
            })))
            .mount(&server)
            .await;

        let provider = SerpApiSearchProvider::with_endpoint("serp-key".to_string(), server.uri());
        let results = provider.search("acme", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://acme.io");
        assert_eq!(results[0].snippet, "Acme is an AP platform.");
    }

    #[tokio::test]
    async fn test_serpapi_error_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "Invalid API key." })))
            .mount(&server)
            .await;

        let provider = SerpApiSearchProvider::with_endpoint("bad".to_string(), server.uri());
        let err = provider.search("acme", 3).await.unwrap_err();

        assert!(err.to_string().contains("Invalid API key."));
    }
}
