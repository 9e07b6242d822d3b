//! Third-party web search used by fallback intelligence gathering.
//!
//! Providers are optional: each one is only constructed when its API key is
//! configured, so a deployment without keys simply has an empty search client.

pub mod brave;
pub mod serpapi;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::base::config::{Config, ConfigInner};

// Types.

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Errors from a search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },
    #[error("{provider} rejected the API key")]
    Unauthorized { provider: &'static str },
    #[error("{provider} API error: {status} - {message}")]
    Api { provider: &'static str, status: u16, message: String },
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

// Traits.

/// Trait for implementing search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync + 'static {
    /// Run one query, returning at most `num_results` hits.
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, SearchError>;

    /// Provider name for logging and provenance labels.
    fn name(&self) -> &'static str;
}

// Structs.

/// Search client for the application.
///
/// Holds the configured providers in priority order. It is designed to be
/// trivially cloneable.
#[derive(Clone, Default)]
pub struct SearchClient {
    providers: Arc<Vec<Arc<dyn SearchProvider>>>,
}

impl Deref for SearchClient {
    type Target = [Arc<dyn SearchProvider>];

    fn deref(&self) -> &Self::Target {
        &self.providers
    }
}

impl SearchClient {
    /// Build the providers whose API keys are configured (Brave first, then SerpAPI).
    pub fn new(config: &Config) -> Self {
        let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();

        if let Some(key) = ConfigInner::optional_key(&config.brave_api_key) {
            providers.push(Arc::new(brave::BraveSearchProvider::new(key.to_string())));
        }

        if let Some(key) = ConfigInner::optional_key(&config.serpapi_api_key) {
            providers.push(Arc::new(serpapi::SerpApiSearchProvider::new(key.to_string())));
        }

        info!("Configured {} search provider(s).", providers.len());

        Self::with_providers(providers)
    }

    pub fn with_providers(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self { providers: Arc::new(providers) }
    }

    pub fn is_available(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Run every query against the first provider that yields any snippet.
    ///
    /// Returns the provider name and the collected results. A failing query is
    /// logged and skipped; it does not abort the remaining queries.
    #[instrument(name = "SearchClient::search_all", skip(self))]
    pub async fn search_all(&self, queries: &[String], results_per_query: usize) -> Option<(&'static str, Vec<SearchResult>)> {
        for provider in self.providers.iter() {
            let mut collected = Vec::new();

            for query in queries {
                match provider.search(query, results_per_query).await {
                    Ok(results) => collected.extend(results.into_iter().filter(|r| !r.snippet.trim().is_empty())),
                    Err(err) => warn!("{} search for `{query}` failed: {err}", provider.name()),
                }
            }

            if !collected.is_empty() {
                info!("{} returned {} snippets.", provider.name(), collected.len());
                return Some((provider.name(), collected));
            }
        }

        None
    }
}

/// Map a non-success status into a provider error.
pub(crate) async fn status_error(provider: &'static str, response: reqwest::Response) -> SearchError {
    let status = response.status().as_u16();

    match status {
        429 => SearchError::RateLimited { provider },
        401 | 403 => SearchError::Unauthorized { provider },
        _ => SearchError::Api {
            provider,
            status,
            message: response.text().await.unwrap_or_default(),
        },
    }
}

// Tests.
