//! Recent-news lookup via NewsAPI.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::base::{
    config::{Config, ConfigInner},
    extract::truncate_chars,
    types::Res,
};

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: usize = 3;
const SNIPPET_CHARS: usize = 200;

/// News client for the application.
///
/// Without an API key every lookup short-circuits to `None` without touching the network.
#[derive(Clone)]
pub struct NewsClient {
    api_key: Option<String>,
    endpoint: String,
    client: Client,
}

impl NewsClient {
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(ConfigInner::optional_key(&config.news_api_key).map(str::to_string), NEWSAPI_URL.to_string())
    }

    pub fn with_endpoint(api_key: Option<String>, endpoint: String) -> Self {
        let client = Client::builder().timeout(Duration::from_secs(10)).build().unwrap_or_default();

        Self { api_key, endpoint, client }
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Recent headlines about `company`, rendered as bullet lines.
    ///
    /// Failures are logged and reported as `None`.
    #[instrument(name = "NewsClient::recent_news", skip(self))]
    pub async fn recent_news(&self, company: &str) -> Option<String> {
        let api_key = self.api_key.as_deref()?;

        match self.fetch_articles(api_key, company).await {
            Ok(articles) if articles.is_empty() => {
                info!("No recent news for {company}.");
                None
            }
            Ok(articles) => {
                info!("Found {} news articles for {company}.", articles.len());
                Some(render_articles(&articles))
            }
            Err(err) => {
                warn!("News lookup for {company} failed: {err}");
                None
            }
        }
    }

    async fn fetch_articles(&self, api_key: &str, company: &str) -> Res<Vec<Article>> {
        let query = format!("\"{company}\" funding OR launch OR partnership");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apiKey", api_key),
                ("q", query.as_str()),
                ("pageSize", &PAGE_SIZE.to_string()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("NewsAPI returned HTTP {status}"));
        }

        let body: NewsResponse = response.json().await?;

        Ok(body.articles.into_iter().filter(|a| !a.title.trim().is_empty()).take(PAGE_SIZE).collect())
    }
}

fn render_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|article| {
            let source = article.source.as_ref().and_then(|s| s.name.as_deref()).map(|name| format!(" ({name})")).unwrap_or_default();

            match article.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                Some(description) => format!("• {}{source}: {}", article.title.trim(), truncate_chars(description, SNIPPET_CHARS)),
                None => format!("• {}{source}", article.title.trim()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: String,
    description: Option<String>,
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

// Tests.
