//! Load configuration via `config` crate with env-override support.

use std::{collections::HashMap, ops::Deref, sync::Arc, time::Duration};

use serde::Deserialize;

use crate::base::reference;

use super::types::{Res, Void};

/// Default OpenAI model to use
fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

/// Default max output tokens for the analysis
fn default_openai_max_tokens() -> u32 {
    1000
}

/// Default reaction that triggers an analysis
fn default_trigger_reaction() -> String {
    "satellite_antenna".to_string()
}

/// Default reaction shown while an analysis is running
fn default_processing_reaction() -> String {
    "eyes".to_string()
}

/// Default reaction shown once the report is posted
fn default_done_reaction() -> String {
    "white_check_mark".to_string()
}

/// Default slash command
fn default_slash_command() -> String {
    "/analyze".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_fetch_max_attempts() -> u32 {
    3
}

fn default_fetch_backoff_ms() -> u64 {
    500
}

/// Below this many characters of visible text, the fallback path kicks in.
fn default_min_content_chars() -> usize {
    100
}

fn default_subpage_min_chars() -> usize {
    200
}

fn default_content_char_budget() -> usize {
    3000
}

fn default_gather_max_probes() -> usize {
    8
}

fn default_true() -> bool {
    true
}

/// Public company profile page; `{slug}` is replaced by the lowercased company name.
fn default_profile_url_template() -> String {
    "https://www.linkedin.com/company/{slug}/about/".to_string()
}

fn default_reference_product_name() -> String {
    reference::REFERENCE_PRODUCT_NAME.to_string()
}

fn default_reference_capabilities() -> String {
    reference::REFERENCE_CAPABILITIES.to_string()
}

/// Configuration for the rival-radar application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// Optional OpenAI-compatible base URL (`OPENAI_BASE_URL`).
    #[serde(default)]
    pub openai_base_url: Option<String>,
    /// OpenAI model to use (`OPENAI_MODEL`).
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Max output tokens for the analysis (`OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Slack app token (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Reaction name that triggers an analysis (`TRIGGER_REACTION`).
    #[serde(default = "default_trigger_reaction")]
    pub trigger_reaction: String,
    /// Reaction added while the analysis runs (`PROCESSING_REACTION`).
    #[serde(default = "default_processing_reaction")]
    pub processing_reaction: String,
    /// Reaction added when the analysis is posted (`DONE_REACTION`).
    #[serde(default = "default_done_reaction")]
    pub done_reaction: String,
    /// Slash command that triggers an analysis (`SLASH_COMMAND`).
    #[serde(default = "default_slash_command")]
    pub slash_command: String,
    /// Brave Search API key (`BRAVE_API_KEY`).
    #[serde(default)]
    pub brave_api_key: Option<String>,
    /// SerpAPI key (`SERPAPI_API_KEY`).
    #[serde(default)]
    pub serpapi_api_key: Option<String>,
    /// NewsAPI key (`NEWS_API_KEY`).
    #[serde(default)]
    pub news_api_key: Option<String>,
    /// Per-request timeout for page fetches, in seconds (`FETCH_TIMEOUT_SECS`).
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Fixed pause before each page fetch, in milliseconds (`FETCH_DELAY_MS`).
    #[serde(default)]
    pub fetch_delay_ms: u64,
    /// Attempts per URL form on 429/5xx (`FETCH_MAX_ATTEMPTS`).
    #[serde(default = "default_fetch_max_attempts")]
    pub fetch_max_attempts: u32,
    /// Base of the exponential backoff, in milliseconds (`FETCH_BACKOFF_MS`).
    #[serde(default = "default_fetch_backoff_ms")]
    pub fetch_backoff_ms: u64,
    /// Minimum visible text for a page to count as readable (`MIN_CONTENT_CHARS`).
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// Minimum visible text for a probed sub-page to be kept (`SUBPAGE_MIN_CHARS`).
    #[serde(default = "default_subpage_min_chars")]
    pub subpage_min_chars: usize,
    /// Character budget for extracted page text (`CONTENT_CHAR_BUDGET`).
    #[serde(default = "default_content_char_budget")]
    pub content_char_budget: usize,
    /// Maximum page probes during fallback gathering (`GATHER_MAX_PROBES`).
    #[serde(default = "default_gather_max_probes")]
    pub gather_max_probes: usize,
    /// Whether fallback gathering guesses `{name}.com` style domains (`PROBE_DOMAIN_GUESSES`).
    #[serde(default = "default_true")]
    pub probe_domain_guesses: bool,
    /// Public profile page template (`PROFILE_URL_TEMPLATE`).
    #[serde(default = "default_profile_url_template")]
    pub profile_url_template: String,
    /// Whether API documentation links found on the page are fetched (`ANALYZE_API_DOCS`).
    #[serde(default)]
    pub analyze_api_docs: bool,
    /// Name of the comparison baseline product (`REFERENCE_PRODUCT_NAME`).
    #[serde(default = "default_reference_product_name")]
    pub reference_product_name: String,
    /// Capability block of the comparison baseline product (`REFERENCE_CAPABILITIES`).
    #[serde(default = "default_reference_capabilities")]
    pub reference_capabilities: String,
    /// Extra known companies, keyed by bare domain (`KNOWN_COMPANIES`).
    #[serde(default)]
    pub known_companies: HashMap<String, String>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: None,
            openai_model: default_openai_model(),
            openai_max_tokens: default_openai_max_tokens(),
            slack_app_token: String::new(),
            slack_bot_token: String::new(),
            trigger_reaction: default_trigger_reaction(),
            processing_reaction: default_processing_reaction(),
            done_reaction: default_done_reaction(),
            slash_command: default_slash_command(),
            brave_api_key: None,
            serpapi_api_key: None,
            news_api_key: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fetch_delay_ms: 0,
            fetch_max_attempts: default_fetch_max_attempts(),
            fetch_backoff_ms: default_fetch_backoff_ms(),
            min_content_chars: default_min_content_chars(),
            subpage_min_chars: default_subpage_min_chars(),
            content_char_budget: default_content_char_budget(),
            gather_max_probes: default_gather_max_probes(),
            probe_domain_guesses: true,
            profile_url_template: default_profile_url_template(),
            analyze_api_docs: false,
            reference_product_name: default_reference_product_name(),
            reference_capabilities: default_reference_capabilities(),
            known_companies: HashMap::new(),
        }
    }
}

impl ConfigInner {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    /// The built-in known-company table merged with any configured entries.
    pub fn known_company_table(&self) -> HashMap<String, String> {
        let mut table = reference::known_companies();
        table.extend(self.known_companies.iter().map(|(k, v)| (k.trim_start_matches("www.").to_lowercase(), v.clone())));
        table
    }

    /// Configured API key, treating blank strings as absent.
    pub fn optional_key(key: &Option<String>) -> Option<&str> {
        key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("RIVAL_RADAR"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check required secrets and tunable ranges.
    pub fn validate(&self) -> Void {
        let required = [
            ("openai_api_key", &self.openai_api_key),
            ("slack_app_token", &self.slack_app_token),
            ("slack_bot_token", &self.slack_bot_token),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("Missing required setting `{name}` (env `RIVAL_RADAR_{}`).", name.to_uppercase()));
            }
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 16384 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 16384."));
        }

        if self.fetch_timeout_secs < 1 || self.fetch_timeout_secs > 120 {
            return Err(anyhow::anyhow!("Fetch timeout must be between 1 and 120 seconds."));
        }

        if self.fetch_max_attempts < 1 {
            return Err(anyhow::anyhow!("Fetch max attempts must be at least 1."));
        }

        if self.content_char_budget < self.min_content_chars {
            return Err(anyhow::anyhow!("Content char budget must not be smaller than the minimum content size."));
        }

        if !self.profile_url_template.contains("{slug}") {
            return Err(anyhow::anyhow!("Profile URL template must contain `{{slug}}`."));
        }

        Ok(())
    }
}

// Tests.
