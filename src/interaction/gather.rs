//! Fallback intelligence gathering for sites that cannot be read directly.
//!
//! Stages run in order and the first one that yields content wins:
//! sub-page and domain-guess probes, search providers, the known-company
//! table, then a public company profile. Every stage swallows its own errors.

use tracing::{info, instrument, warn};
use url::Url;

use crate::{
    base::{
        config::Config,
        extract::{extract_text, meta_description, truncate_chars},
        prompts::MANUAL_RESEARCH_PLACEHOLDER,
        types::{AnalysisError, IntelligenceBundle, Provenance},
    },
    service::{search::SearchClient, web::WebClient},
};

const SUB_PATHS: &[&str] = &["/about", "/features", "/pricing", "/product", "/api", "/docs"];
const GUESS_TLDS: &[&str] = &["com", "io"];
const MAX_SUBPAGES: usize = 2;
const RESULTS_PER_QUERY: usize = 3;

/// Runs the fallback stages for one target, tracking the shared probe budget.
pub struct Gatherer<'a> {
    config: &'a Config,
    web: &'a WebClient,
    search: &'a SearchClient,
    probes_used: usize,
}

impl<'a> Gatherer<'a> {
    pub fn new(config: &'a Config, web: &'a WebClient, search: &'a SearchClient) -> Self {
        Self {
            config,
            web,
            search,
            probes_used: 0,
        }
    }

    /// Page probes issued so far.
    pub fn probes_used(&self) -> usize {
        self.probes_used
    }

    /// Gather whatever can be found about `company_name`.
    ///
    /// `homepage_text` is any (short) text the direct fetch did manage to
    /// extract; it is kept at the front of the bundle.
    #[instrument(name = "Gatherer::gather", skip(self, homepage_text))]
    pub async fn gather(&mut self, url: &str, company_name: &str, homepage_text: &str) -> IntelligenceBundle {
        let bundle = match self.stages(url, company_name).await {
            Some(bundle) => bundle,
            None => {
                warn!("{}", AnalysisError::AuxiliaryGatherExhausted);

                IntelligenceBundle {
                    provenance: Provenance::Failed,
                    text: MANUAL_RESEARCH_PLACEHOLDER.to_string(),
                    sources: Vec::new(),
                }
            }
        };

        info!("Gathered {} intelligence after {} probes.", bundle.provenance, self.probes_used);

        with_homepage_text(bundle, homepage_text)
    }

    async fn stages(&mut self, url: &str, company_name: &str) -> Option<IntelligenceBundle> {
        if let Some(bundle) = self.probe_pages(url, company_name).await {
            return Some(bundle);
        }

        if let Some(bundle) = self.search_snippets(company_name).await {
            return Some(bundle);
        }

        if let Some(bundle) = self.known_company(url) {
            return Some(bundle);
        }

        self.profile(company_name).await
    }

    /// Stage a: sub-paths on the original origin, then guessed vendor domains.
    async fn probe_pages(&mut self, url: &str, company_name: &str) -> Option<IntelligenceBundle> {
        let parsed = Url::parse(url).ok()?;
        let origin = parsed.origin().ascii_serialization();
        let host = bare_host(&parsed);

        let mut candidates = SUB_PATHS.iter().map(|path| format!("{origin}{path}")).collect::<Vec<_>>();

        if self.config.probe_domain_guesses {
            let slug = domain_slug(company_name);

            if !slug.is_empty() {
                candidates.extend(
                    GUESS_TLDS
                        .iter()
                        .map(|tld| format!("{slug}.{tld}"))
                        .filter(|guess| Some(guess.as_str()) != host.as_deref())
                        .map(|guess| format!("https://{guess}")),
                );
            }
        }

        // One probe stays reserved for the profile stage.
        let stage_budget = self.config.gather_max_probes.saturating_sub(1);
        let per_page_budget = (self.config.content_char_budget / MAX_SUBPAGES).max(self.config.subpage_min_chars);

        let mut pages = Vec::new();

        for candidate in candidates {
            if pages.len() >= MAX_SUBPAGES || self.probes_used >= stage_budget {
                break;
            }

            self.probes_used += 1;

            let result = self.web.probe(&candidate).await;
            let Some(body) = result.body.as_deref().filter(|_| result.is_success()) else {
                continue;
            };

            let text = extract_text(body, per_page_budget);

            if text.chars().count() >= self.config.subpage_min_chars {
                info!("Collected {} chars from {candidate}.", text.chars().count());
                pages.push((candidate, text));
            }
        }

        if pages.is_empty() {
            return None;
        }

        let text = pages.iter().map(|(url, text)| format!("From {url}:\n{text}")).collect::<Vec<_>>().join("\n\n");

        Some(IntelligenceBundle {
            provenance: Provenance::Gathered,
            text,
            sources: pages.into_iter().map(|(url, _)| url).collect(),
        })
    }

    /// Stage b: canned queries against the configured search providers.
    async fn search_snippets(&self, company_name: &str) -> Option<IntelligenceBundle> {
        if !self.search.is_available() {
            return None;
        }

        let queries = search_queries(company_name);
        let (provider, results) = self.search.search_all(&queries, RESULTS_PER_QUERY).await?;

        let lines = results.iter().map(|r| format!("• {}: {}", r.title.trim(), r.snippet.trim())).collect::<Vec<_>>().join("\n");

        let mut sources = vec![format!("{provider} search")];
        sources.extend(results.into_iter().map(|r| r.url));

        Some(IntelligenceBundle {
            provenance: Provenance::Gathered,
            text: truncate_chars(&format!("Search results:\n{lines}"), self.config.content_char_budget),
            sources,
        })
    }

    /// Stage c: the static known-company table.
    fn known_company(&self, url: &str) -> Option<IntelligenceBundle> {
        let parsed = Url::parse(url).ok()?;
        let host = bare_host(&parsed)?;
        let table = self.config.known_company_table();

        // Walk up the labels so `app.ramp.com` still matches `ramp.com`.
        let mut candidate = host.as_str();
        loop {
            if let Some(summary) = table.get(candidate) {
                info!("Using stored summary for {candidate}.");

                return Some(IntelligenceBundle {
                    provenance: Provenance::Manual,
                    text: format!("Stored company summary:\n{summary}"),
                    sources: vec![format!("known-company table ({candidate})")],
                });
            }

            let (_, rest) = candidate.split_once('.')?;
            if !rest.contains('.') {
                return None;
            }
            candidate = rest;
        }
    }

    /// Stage d: a public company profile page's description.
    async fn profile(&mut self, company_name: &str) -> Option<IntelligenceBundle> {
        if self.probes_used >= self.config.gather_max_probes {
            return None;
        }

        let slug = profile_slug(company_name);
        if slug.is_empty() {
            return None;
        }

        let profile_url = self.config.profile_url_template.replace("{slug}", &slug);
        self.probes_used += 1;

        let result = self.web.probe(&profile_url).await;
        let description = result.body.as_deref().filter(|_| result.is_success()).and_then(meta_description)?;

        Some(IntelligenceBundle {
            provenance: Provenance::Gathered,
            text: format!("Company profile:\n{description}"),
            sources: vec![profile_url],
        })
    }
}

fn with_homepage_text(mut bundle: IntelligenceBundle, homepage_text: &str) -> IntelligenceBundle {
    let homepage_text = homepage_text.trim();

    if !homepage_text.is_empty() {
        bundle.text = format!("Homepage excerpt:\n{homepage_text}\n\n{}", bundle.text);
    }

    bundle
}

fn bare_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.trim_start_matches("www.").to_lowercase())
}

/// The queries sent to search providers.
pub fn search_queries(company_name: &str) -> Vec<String> {
    vec![
        format!("{company_name} company overview"),
        format!("{company_name} accounts payable invoicing payments"),
        format!("{company_name} API integrations pricing"),
    ]
}

/// `Acme Pay` -> `acmepay`, used for `{name}.com` style guesses.
fn domain_slug(company_name: &str) -> String {
    company_name.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_lowercase()
}

/// `Acme Pay` -> `acme-pay`, used for profile URLs.
fn profile_slug(company_name: &str) -> String {
    company_name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

// Tests.
