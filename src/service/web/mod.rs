//! Page fetching for target websites.
//!
//! Requests look like a desktop browser: a rotating user agent and the usual
//! `Accept*` headers. Every failure is folded into a [`FetchResult`] outcome
//! tag so callers never have to handle a transport error themselves.

pub mod retry;

use std::{error::Error as StdError, net::IpAddr, ops::Deref, sync::Arc, time::Duration};

use rand::seq::SliceRandom;
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS, USER_AGENT},
    redirect,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::base::{
    config::Config,
    types::{FetchOutcome, FetchResult, Res},
};

use retry::RetryPolicy;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

const MAX_REDIRECTS: usize = 5;

/// Web client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct WebClient {
    inner: Arc<WebClientInner>,
}

impl Deref for WebClient {
    type Target = WebClientInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct WebClientInner {
    client: Client,
    /// Pause before every page request.
    pub delay: Duration,
    /// Policy for the primary page fetch.
    pub page_policy: RetryPolicy,
    /// Policy for fallback probes, which should give up quickly.
    pub probe_policy: RetryPolicy,
}

impl WebClient {
    /// Create a web client from the application configuration.
    pub fn new(config: &Config) -> Res<Self> {
        let page_policy = RetryPolicy::new(config.fetch_max_attempts, Duration::from_millis(config.fetch_backoff_ms));

        Self::with_settings(config.fetch_timeout(), config.fetch_delay(), page_policy, RetryPolicy::once())
    }

    /// Create a web client with explicit settings.
    pub fn with_settings(timeout: Duration, delay: Duration, page_policy: RetryPolicy, probe_policy: RetryPolicy) -> Res<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            inner: Arc::new(WebClientInner {
                client,
                delay,
                page_policy,
                probe_policy,
            }),
        })
    }

    /// Fetch a target page.
    ///
    /// Applies the pacing delay and the page retry policy; when the URL as given
    /// fails, the `www.`-toggled form is tried once before giving up.
    #[instrument(name = "WebClient::fetch", skip(self))]
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let primary = self.fetch_with_policy(url, &self.page_policy).await;

        if primary.is_success() {
            return primary;
        }

        let Some(alternate) = alternate_url(url) else {
            return primary;
        };

        info!("Primary fetch {:?}, trying alternate form {alternate}", primary.outcome);

        let secondary = self.fetch_with_policy(&alternate, &self.page_policy).await;
        if secondary.is_success() { secondary } else { primary }
    }

    /// Probe a secondary page (sub-paths, guessed domains, profile pages) with the probe policy.
    #[instrument(name = "WebClient::probe", skip(self))]
    pub async fn probe(&self, url: &str) -> FetchResult {
        self.fetch_with_policy(url, &self.probe_policy).await
    }

    async fn fetch_with_policy(&self, url: &str, policy: &RetryPolicy) -> FetchResult {
        let mut attempt = 1;

        loop {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let result = self.fetch_once(url).await;

            match result.status {
                Some(status) if result.outcome == FetchOutcome::Blocked && policy.should_retry(attempt, status) => {
                    let delay = policy.delay_after(attempt);
                    warn!("HTTP {status} from {url}, retrying {attempt}/{} after {delay:?}", policy.max_attempts);

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                _ => return result,
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> FetchResult {
        let user_agent = USER_AGENTS.choose(&mut rand::thread_rng()).copied().unwrap_or(USER_AGENTS[0]);

        let response = match self.client.get(url).header(USER_AGENT, user_agent).send().await {
            Ok(response) => response,
            Err(err) => return failure(url, None, &err),
        };

        let status = response.status().as_u16();

        if status != 200 {
            warn!("HTTP {status} from {url}");

            return FetchResult {
                url: url.to_string(),
                status: Some(status),
                body: None,
                outcome: FetchOutcome::Blocked,
                detail: Some(format!("HTTP {status}")),
            };
        }

        match response.text().await {
            Ok(body) => {
                debug!("Fetched {} bytes from {url}", body.len());

                FetchResult {
                    url: url.to_string(),
                    status: Some(status),
                    body: Some(body),
                    outcome: FetchOutcome::Success,
                    detail: None,
                }
            }
            Err(err) => failure(url, Some(status), &err),
        }
    }
}

/// Convert a transport error into a tagged failure.
fn failure(url: &str, status: Option<u16>, err: &reqwest::Error) -> FetchResult {
    let outcome = if err.is_timeout() {
        FetchOutcome::Timeout
    } else if is_tls_error(err) {
        FetchOutcome::TlsError
    } else {
        FetchOutcome::ConnectionError
    };

    let detail = error_chain(err);
    warn!("Fetch of {url} failed ({outcome:?}): {detail}");

    FetchResult {
        url: url.to_string(),
        status,
        body: None,
        outcome,
        detail: Some(detail),
    }
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();

    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }

    parts.join(": ")
}

fn is_tls_error(err: &reqwest::Error) -> bool {
    let chain = error_chain(err).to_lowercase();
    ["certificate", "tls", "ssl", "handshake"].iter().any(|needle| chain.contains(needle))
}

/// The same URL with `www.` inserted or removed; `None` for IPs and single-label hosts.
pub fn alternate_url(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();

    if host.parse::<IpAddr>().is_ok() || !host.contains('.') {
        return None;
    }

    let alternate = match host.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => format!("www.{host}"),
    };

    parsed.set_host(Some(&alternate)).ok()?;

    Some(parsed.to_string())
}

// Tests.
