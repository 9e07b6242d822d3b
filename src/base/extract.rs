//! Pure text-extraction heuristics.
//!
//! Nothing in here touches the network. Every function takes a string and
//! returns a value, so the fallback order of each heuristic can be tested in
//! isolation. The company-name guess is best-effort: it reads page titles the
//! way a human skimming a browser tab would, and it will sometimes be wrong.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::base::types::ExtractedContent;

/// Title used when a page has none.
pub const NO_TITLE: &str = "No title";

/// Name used when neither the title nor the URL yields anything.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Generic words that are never a company name on their own.
const STOPLIST: &[&str] = &["the", "ai", "api", "app", "web", "new", "best", "top", "powered", "home", "welcome"];

/// Elements whose text is never shown to a reader.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "svg", "template", "head", "title", "iframe"];

const API_HREF_PATTERNS: &[&str] = &[
    "/api",
    "/docs",
    "/developers",
    "/documentation",
    "/dev",
    "/api-docs",
    "/reference",
    "/api-reference",
    "/guides",
    "/integrate",
];

const API_TEXT_KEYWORDS: &[&str] = &["api", "docs", "developer", "documentation", "integrate"];

const MAX_API_DOC_LINKS: usize = 5;

/// Segments with more words than this are treated as taglines rather than names.
const MAX_NAME_WORDS: usize = 3;

// Statics.

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap())
}

fn selector(css: &str) -> Selector {
    // Only called with the literal selectors below, all of which parse.
    Selector::parse(css).unwrap()
}

// URLs.

/// Every substring of `text` that looks like an http(s) URL, in order of appearance.
pub fn extract_urls(text: &str) -> Vec<String> {
    url_pattern().find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Strip sentence punctuation that commonly trails a pasted link.
pub fn trim_url(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'', '*', '_'])
}

/// Find the first URL in free text; bare domains like `acme.com` are accepted as well.
pub fn first_url(text: &str) -> Option<String> {
    if let Some(url) = extract_urls(text).into_iter().next() {
        return Some(trim_url(&url).to_string());
    }

    text.split_whitespace()
        .map(|word| trim_url(word.trim_start_matches('<').trim_end_matches('>')))
        .filter(|word| word.contains('.') && !word.contains('@') && !word.starts_with('.'))
        .map(|word| format!("https://{word}"))
        .find(|url| Url::parse(url).ok().and_then(|u| u.host_str().map(looks_like_domain)).unwrap_or(false))
}

/// `acme.io` yes; `e.g`, `i.e.` and `v1.2` no.
fn looks_like_domain(host: &str) -> bool {
    let labels = host.split('.').collect::<Vec<_>>();

    let Some(tld) = labels.last() else {
        return false;
    };

    let single_letters = labels.iter().filter(|l| l.chars().count() == 1).count();

    labels.len() >= 2 && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()) && single_letters <= 1 && labels.iter().all(|l| !l.is_empty())
}

// HTML.

/// Extract the title, visible text and a company-name guess from a page.
pub fn extract_content(html: &str, url: &str, char_budget: usize) -> ExtractedContent {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let text = truncate_chars(&visible_text(&document), char_budget);
    let company_name = infer_company_name(title.as_deref(), url);

    ExtractedContent { title, text, company_name }
}

/// Visible text of an HTML fragment or document, whitespace-collapsed and bounded.
pub fn extract_text(html: &str, char_budget: usize) -> String {
    let document = Html::parse_document(html);
    truncate_chars(&visible_text(&document), char_budget)
}

fn extract_title(document: &Html) -> Option<String> {
    document
        .select(&selector("title"))
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<Vec<_>>().join(" ")))
        .filter(|t| !t.is_empty())
}

fn visible_text(document: &Html) -> String {
    let root = document.select(&selector("body")).next().unwrap_or_else(|| document.root_element());

    let parts = root
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| a.value().as_element().is_some_and(|e| HIDDEN_TAGS.contains(&e.name())));

            (!hidden).then_some(&**text)
        })
        .collect::<Vec<&str>>();

    collapse_whitespace(&parts.join(" "))
}

/// A short description from `og:description` or `meta[name=description]`.
pub fn meta_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    ["meta[property='og:description']", "meta[name='description']"]
        .into_iter()
        .filter_map(|css| document.select(&selector(css)).next())
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|d| !d.is_empty())
}

/// Links on the page that look like API or developer documentation.
pub fn find_api_doc_links(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };

    let mut links = Vec::new();

    for anchor in document.select(&selector("a[href]")) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        if !looks_like_api_link(href, &anchor) {
            continue;
        }

        let resolved = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            match base.join(href) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            }
        } else {
            continue;
        };

        if !links.contains(&resolved) {
            links.push(resolved);
        }

        if links.len() >= MAX_API_DOC_LINKS {
            break;
        }
    }

    links
}

fn looks_like_api_link(href: &str, anchor: &ElementRef) -> bool {
    let href = href.to_lowercase();
    let text = anchor.text().collect::<String>().to_lowercase();

    API_HREF_PATTERNS.iter().any(|p| href.contains(p)) || API_TEXT_KEYWORDS.iter().any(|k| text.contains(k))
}

// Company names.

/// Best-effort company name from a page title, falling back to the URL.
///
/// Never returns an empty string.
pub fn infer_company_name(title: Option<&str>, url: &str) -> String {
    title
        .filter(|t| *t != NO_TITLE)
        .and_then(company_name_from_title)
        .unwrap_or_else(|| company_name_from_url(url))
}

/// Guess a company name from a page title.
///
/// Fallback order:
/// 1. `|`-separated: the first segment unless it is a long tagline, then the last.
/// 2. `-`-separated: the first segment unless it is a long tagline, then the shortest.
/// 3. Otherwise the first capitalized word, then the first word, then the whole title.
///
/// A stoplisted result is swapped for an alternate candidate whenever one exists.
pub fn company_name_from_title(title: &str) -> Option<String> {
    let title = collapse_whitespace(title);
    if !title.chars().any(char::is_alphanumeric) {
        return None;
    }

    let candidates = if title.contains('|') {
        pipe_candidates(&title)
    } else if let Some(parts) = dash_segments(&title) {
        dash_candidates(&parts)
    } else {
        word_candidates(&title)
    };

    let name = candidates
        .iter()
        .find(|c| !is_stopword(c))
        .or_else(|| candidates.first())
        .map(|c| clean_name(c))
        .filter(|c| c.chars().any(char::is_alphanumeric))
        .unwrap_or(title);

    Some(name)
}

/// A capitalized fragment of the URL's domain, e.g. `https://www.acme.io/x` -> `Acme`.
pub fn company_name_from_url(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.trim_start_matches("https://").trim_start_matches("http://").split('/').next().unwrap_or_default().to_string());

    let label = host.trim_start_matches("www.").split('.').next().unwrap_or_default();

    let name = capitalize(label);
    if name.is_empty() { UNKNOWN_COMPANY.to_string() } else { name }
}

fn pipe_candidates(title: &str) -> Vec<String> {
    let parts = segments(title, &["|"]);

    let (first, last) = match (parts.first(), parts.last()) {
        (Some(first), Some(last)) => (first.clone(), last.clone()),
        _ => return word_candidates(title),
    };

    let mut candidates = if word_count(&first) <= MAX_NAME_WORDS { vec![first, last] } else { vec![last, first] };
    candidates.extend(parts.into_iter().skip(1));

    candidates
}

fn dash_segments(title: &str) -> Option<Vec<String>> {
    // Prefer spaced dashes so hyphenated names survive.
    for separators in [&[" - ", " – ", " — "][..], &["-"][..]] {
        let parts = segments(title, separators);
        if parts.len() > 1 {
            return Some(parts);
        }
    }

    None
}

fn dash_candidates(parts: &[String]) -> Vec<String> {
    let first = parts[0].clone();

    let mut candidates = Vec::new();

    if word_count(&first) <= MAX_NAME_WORDS {
        candidates.push(first.clone());
    } else if let Some(shortest) = parts.iter().min_by_key(|p| p.chars().count()) {
        candidates.push(shortest.clone());
    }

    // Alternates: the words of the first segment, then the remaining segments.
    candidates.extend(first.split_whitespace().map(str::to_string));
    candidates.extend(parts.iter().skip(1).cloned());

    candidates
}

fn word_candidates(title: &str) -> Vec<String> {
    let words = title.split_whitespace().collect::<Vec<_>>();

    let mut candidates = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase) && w.chars().count() > 2)
        .map(|w| w.to_string())
        .collect::<Vec<_>>();

    candidates.extend(words.iter().map(|w| w.to_string()));
    candidates.push(title.to_string());

    candidates
}

fn segments(title: &str, separators: &[&str]) -> Vec<String> {
    let mut parts = vec![title.to_string()];

    for sep in separators {
        parts = parts.iter().flat_map(|p| p.split(sep).map(str::to_string).collect::<Vec<_>>()).collect();
    }

    parts.into_iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

fn is_stopword(candidate: &str) -> bool {
    let lower = clean_name(candidate).to_lowercase();
    lower.is_empty() || STOPLIST.contains(&lower.as_str())
}

fn clean_name(name: &str) -> String {
    name.trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | ',' | '.' | '·' | '•')).to_string()
}

fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// Text helpers.

/// Collapse every run of whitespace into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_urls_preserves_order() {
        let text = "see https://a.com/x and <http://b.io|b.io> then https://c.dev";

        assert_eq!(extract_urls(text), vec!["https://a.com/x", "http://b.io", "https://c.dev"]);
    }

    #[test]
    fn test_extract_urls_empty_when_none() {
        assert!(extract_urls("no links here, just acme dot com").is_empty());
        assert!(extract_urls("").is_empty());
    }

    #[test]
    fn test_first_url_trims_punctuation_and_accepts_bare_domains() {
        assert_eq!(first_url("check out https://example.com."), Some("https://example.com".to_string()));
        assert_eq!(first_url("acme.io"), Some("https://acme.io".to_string()));
        assert_eq!(first_url("hello there"), None);
        assert_eq!(first_url("mail me at bob@acme.io"), None);
    }

    #[test]
    fn test_first_url_skips_abbreviations() {
        assert_eq!(first_url("see e.g. the deck"), None);
        assert_eq!(first_url("i.e. later, v1.2 maybe"), None);
        assert_eq!(first_url("see e.g. acme.com for details"), Some("https://acme.com".to_string()));
    }

    #[test]
    fn test_separator_only_title_falls_back_to_domain() {
        assert_eq!(company_name_from_title("|"), None);
        assert_eq!(company_name_from_title(" - "), None);
        assert_eq!(infer_company_name(Some("|"), "https://acme.io"), "Acme");
        assert_eq!(infer_company_name(Some(" - | - "), "https://www.melio.com"), "Melio");
    }

    #[test]
    fn test_company_name_from_pipe_title() {
        assert_eq!(company_name_from_title("Example Co | Home").as_deref(), Some("Example Co"));
        assert_eq!(company_name_from_title("The best way to pay your vendors online | Acme").as_deref(), Some("Acme"));
    }

    #[test]
    fn test_company_name_from_dash_title() {
        assert_eq!(company_name_from_title("Acme - Invoicing for modern finance teams").as_deref(), Some("Acme"));
        assert_eq!(company_name_from_title("Accounts payable automation for growing teams - Acme").as_deref(), Some("Acme"));
        assert_eq!(company_name_from_title("Acme Pay – Invoicing").as_deref(), Some("Acme Pay"));
    }

    #[test]
    fn test_company_name_avoids_stoplist_when_alternate_exists() {
        assert_eq!(company_name_from_title("Home | Acme").as_deref(), Some("Acme"));
        assert_eq!(company_name_from_title("API - Acme Payments").as_deref(), Some("Acme Payments"));
        assert_eq!(company_name_from_title("Welcome to Acme").as_deref(), Some("Acme"));
    }

    #[test]
    fn test_company_name_without_separators() {
        assert_eq!(company_name_from_title("payments made simple").as_deref(), Some("payments"));
        assert_eq!(company_name_from_title("Acme").as_deref(), Some("Acme"));
        assert_eq!(company_name_from_title("   "), None);
    }

    #[test]
    fn test_company_name_is_deterministic() {
        let title = "Ramp | Corporate Cards and Spend Management";

        let first = company_name_from_title(title);
        for _ in 0..10 {
            assert_eq!(company_name_from_title(title), first);
        }
    }

    #[test]
    fn test_company_name_falls_back_to_domain() {
        assert_eq!(infer_company_name(None, "https://www.acme.io/pricing"), "Acme");
        assert_eq!(infer_company_name(Some(NO_TITLE), "https://tipalti.com"), "Tipalti");
        assert_eq!(infer_company_name(Some(""), "not a url"), "Not a url");
        assert_eq!(company_name_from_url(""), UNKNOWN_COMPANY);
    }

    #[test]
    fn test_extract_content_skips_hidden_text() {
        let html = r#"
            <html>
              <head><title> Example Co | Home </title><style>.x { color: red }</style></head>
              <body>
                <script>var tracking = 1;</script>
                <h1>Pay   your
                    bills</h1>
                <p>Fast invoicing.</p>
                <noscript>Enable JS</noscript>
              </body>
            </html>
        "#;

        let content = extract_content(html, "https://example.com", 3000);

        assert_eq!(content.title.as_deref(), Some("Example Co | Home"));
        assert_eq!(content.text, "Pay your bills Fast invoicing.");
        assert_eq!(content.company_name, "Example Co");
    }

    #[test]
    fn test_extract_content_truncates_to_budget() {
        let body = "é".repeat(5000);
        let html = format!("<html><body><p>{body}</p></body></html>");

        let content = extract_content(&html, "https://example.com", 3000);

        assert_eq!(content.text.chars().count(), 3000);
        assert_eq!(content.title, None);
        assert_eq!(content.company_name, "Example");
    }

    #[test]
    fn test_find_api_doc_links() {
        let html = r#"
            <a href="/docs/getting-started">Docs</a>
            <a href="https://developers.acme.io">Build with us</a>
            <a href="/pricing">Pricing</a>
            <a href="mailto:api@acme.io">API</a>
            <a href="/docs/getting-started">Docs again</a>
            <a href="/blog">Developer blog</a>
        "#;

        let links = find_api_doc_links(html, "https://acme.io/");

        assert_eq!(
            links,
            vec!["https://acme.io/docs/getting-started", "https://developers.acme.io", "https://acme.io/blog"]
        );
    }

    #[test]
    fn test_meta_description_prefers_open_graph() {
        let html = r#"<head><meta name="description" content="plain"><meta property="og:description" content=" Acme  builds AP tools "></head>"#;

        assert_eq!(meta_description(html).as_deref(), Some("Acme builds AP tools"));
        assert_eq!(meta_description("<p>nothing</p>"), None);
    }
}
