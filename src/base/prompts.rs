//! Prompt templates and user-facing message strings.

use crate::base::{
    config::Config,
    types::{AccessStatus, IntelligenceBundle, Provenance},
};

/// Banner prepended to every posted report.
pub const REPORT_BANNER: &str = "🚨 *RivalRadar Analysis*";

/// Posted when a reacted message has no link in it.
pub const NO_URL_NOTICE: &str = "📡 RivalRadar triggered but no URLs found in this message!";

/// Slash command usage hint.
pub const COMMAND_USAGE: &str = "Please provide a URL to analyze: `/analyze https://competitor.com`";

/// Placeholder used when every intelligence source came up empty.
pub const MANUAL_RESEARCH_PLACEHOLDER: &str =
    "No information could be gathered automatically: the website blocked access and no search, lookup or profile source returned usable content. Manual research recommended.";

/// Used when no news provider is configured or it found nothing.
pub const NO_RECENT_NEWS: &str = "No recent news available.";

/// Used when API documentation was not analyzed.
pub const NO_API_DOCS: &str = "No API docs analyzed - analysis limited to website content.";

/// Section template the model is asked to reproduce.
const OUTPUT_TEMPLATE: &str = r#####"
Analyze in this format:

*THREAT LEVEL:* 🔴 HIGH / 🟡 MEDIUM / 💚 LOW

*THREAT JUSTIFICATION:*
[Why this company is or is not a threat. Name the concrete overlapping capabilities you found.]

*RECENT DEVELOPMENTS:*
[Key insights from recent news: funding, product launches, partnerships, market expansion.]

*CAPABILITY COMPARISON:*
[For each capability area of the reference product above: what they offer vs. what {product} offers.]

*API & INTEGRATION COMPARISON:*
[Endpoints, authentication, webhooks, SDKs and accounting/ERP integrations vs. {product}.]

*PRODUCT TEAM ANALYSIS:*
- Feature gaps in {product}: [Features they offer that {product} lacks]
- Technical architecture differences: [API design, integration patterns, scalability approaches]
- Investigation priorities: [Specific areas for the {product} product team to research]

*SALES TEAM POSITIONING:*
- {product}'s competitive advantages: [Strengths to emphasize in sales conversations]
- Competitor vulnerabilities: [Gaps in their offering to exploit]
- Discovery questions: [Questions to ask prospects that highlight {product}'s strengths]

*MARKET POSITIONING:*
[Their go-to-market strategy and target customers vs. {product}'s positioning.]

*DATA LIMITATIONS:*
[What could not be verified and why. Write "None" only if the website was read directly.]

*OBJECTIVE ASSESSMENT:*
[Balanced view; if uncertain, lean toward the higher threat level.]
"#####;

/// Formatting rules for Slack's mrkdwn.
const SLACK_FORMAT: &str = r#####"
FORMAT FOR SLACK:
- Use *bold text* for headers (single asterisks, not **bold**)
- Add blank lines between sections for spacing
- Use emoji for threat level: 🔴 HIGH, 🟡 MEDIUM, 💚 LOW
- Keep it clean, readable and short enough for a single Slack message
"#####;

/// Everything the prompt needs about one target.
#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub company_name: &'a str,
    pub access_status: AccessStatus,
    pub bundle: &'a IntelligenceBundle,
    pub recent_news: Option<&'a str>,
    pub api_docs: Option<&'a str>,
}

/// Assemble the analysis prompt.
///
/// Section order is fixed: framing, company data, recent developments, API docs,
/// reference capabilities, threat framework, output template, Slack formatting,
/// then the data-quality instruction that depends on provenance.
pub fn build_analysis_prompt(config: &Config, input: &PromptInput<'_>) -> String {
    let product = config.reference_product_name.as_str();

    let sources = if input.bundle.sources.is_empty() {
        "none".to_string()
    } else {
        input.bundle.sources.join(", ")
    };

    let framing = format!(
        "You are analyzing a potential competitor to {product}. Be AGGRESSIVE in threat assessment: it is better to overestimate than underestimate threats."
    );

    let company_data = format!(
        "COMPETITOR DATA:\nURL: {url}\nTitle: {title}\nDetected company name: {company}\nAccess status: {access}\nData provenance: {provenance} (sources: {sources})\nContent:\n{content}",
        url = input.url,
        title = input.title,
        company = input.company_name,
        access = input.access_status,
        provenance = input.bundle.provenance,
        content = input.bundle.text,
    );

    let news = format!("RECENT NEWS (last 3 months):\n{}", input.recent_news.unwrap_or(NO_RECENT_NEWS));
    let api_docs = format!("API DOCUMENTATION:\n{}", input.api_docs.unwrap_or(NO_API_DOCS));

    let framework = format!(
        "THREAT ASSESSMENT FRAMEWORK:\n\n*HIGH THREAT* = direct functional overlap with {product}'s capabilities above + market-fit signals (same target customers, funding, traction, partnerships).\n*MEDIUM THREAT* = adjacent financial or workflow products with clear expansion potential into {product}'s space.\n*LOW THREAT* = a different market with no meaningful overlap."
    );

    let template = OUTPUT_TEMPLATE.replace("{product}", product);

    [
        framing,
        company_data,
        news,
        api_docs,
        config.reference_capabilities.trim().to_string(),
        framework,
        template.trim().to_string(),
        SLACK_FORMAT.trim().to_string(),
        data_quality_instruction(input.bundle.provenance, input.access_status),
    ]
    .join("\n\n")
}

/// The instruction telling the model how far it may trust the company data.
fn data_quality_instruction(provenance: Provenance, access: AccessStatus) -> String {
    match provenance {
        Provenance::Direct => "DATA QUALITY: the content above was read directly from the company's website.".to_string(),
        Provenance::Gathered => format!(
            "CRITICAL: the website could not be read directly (access status: {access}). The content above was gathered from secondary sources. State this limitation clearly under *DATA LIMITATIONS:* but still assess the threat from the available information. Don't default to LOW threat just because of technical limitations."
        ),
        Provenance::Manual => format!(
            "CRITICAL: the website could not be read directly (access status: {access}). The content above is a pre-written internal summary, not live data. Say so under *DATA LIMITATIONS:* and flag anything that may be outdated."
        ),
        Provenance::Failed => format!(
            "CRITICAL: no reliable information about this company could be collected (access status: {access}). Do NOT invent products, customers or funding. Mark the threat level as provisional, say clearly under *DATA LIMITATIONS:* that manual research is recommended, and limit the rest of the analysis to what the URL and company name alone imply."
        ),
    }
}

/// The note appended to a posted report when the site was not read directly.
pub fn data_limitation_note(provenance: Provenance, access: AccessStatus) -> Option<String> {
    let reason = match access {
        AccessStatus::Accessible => "the page had too little readable text".to_string(),
        other => format!("the site could not be read directly ({other})"),
    };

    match provenance {
        Provenance::Direct => None,
        Provenance::Gathered => Some(format!("_⚠️ Data limitations: {reason}; this assessment is based on secondary sources._")),
        Provenance::Manual => Some(format!("_⚠️ Data limitations: {reason}; this assessment is based on a stored company summary._")),
        Provenance::Failed => Some(format!("_⚠️ Data limitations: {reason} and no other source returned usable content. Manual research recommended._")),
    }
}

/// The full message posted for a finished report.
pub fn format_report_message(report_text: &str, provenance: Provenance, access: AccessStatus) -> String {
    match data_limitation_note(provenance, access) {
        Some(note) => format!("{REPORT_BANNER}\n\n{}\n\n{note}", report_text.trim()),
        None => format!("{REPORT_BANNER}\n\n{}", report_text.trim()),
    }
}

/// The message posted when a request fails.
pub fn format_failure_message(error: &str) -> String {
    format!("❌ RivalRadar error: {error}")
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::base::{config::ConfigInner, reference::REFERENCE_CAPABILITIES};

    fn bundle(provenance: Provenance, text: &str) -> IntelligenceBundle {
        IntelligenceBundle {
            provenance,
            text: text.to_string(),
            sources: vec!["https://example.com".to_string()],
        }
    }

    fn config() -> Config {
        Config {
            inner: Arc::new(ConfigInner::default()),
        }
    }

    fn input<'a>(bundle: &'a IntelligenceBundle, access_status: AccessStatus) -> PromptInput<'a> {
        PromptInput {
            url: "https://example.com",
            title: "Example Co | Home",
            company_name: "Example Co",
            access_status,
            bundle,
            recent_news: None,
            api_docs: None,
        }
    }

    #[test]
    fn test_prompt_contains_url_name_and_reference_block() {
        let bundle = bundle(Provenance::Direct, "We automate accounts payable.");
        let prompt = build_analysis_prompt(&config(), &input(&bundle, AccessStatus::Accessible));

        assert!(prompt.contains("https://example.com"));
        assert!(prompt.contains("Example Co"));
        assert!(prompt.contains(REFERENCE_CAPABILITIES.trim()));
        assert!(prompt.contains("We automate accounts payable."));
        assert!(prompt.contains("*THREAT LEVEL:*"));
        assert!(!prompt.contains("{product}"));
    }

    #[test]
    fn test_prompt_sections_are_ordered() {
        let bundle = bundle(Provenance::Direct, "text");
        let prompt = build_analysis_prompt(&config(), &input(&bundle, AccessStatus::Accessible));

        let positions = ["COMPETITOR DATA:", "RECENT NEWS", "API DOCUMENTATION:", "MONITE'S DETAILED", "THREAT ASSESSMENT FRAMEWORK:", "*THREAT LEVEL:*", "FORMAT FOR SLACK:", "DATA QUALITY:"]
            .iter()
            .map(|marker| prompt.find(marker).unwrap_or_else(|| panic!("missing {marker}")))
            .collect::<Vec<_>>();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn test_prompt_wording_follows_provenance() {
        let failed = bundle(Provenance::Failed, MANUAL_RESEARCH_PLACEHOLDER);
        let prompt = build_analysis_prompt(&config(), &input(&failed, AccessStatus::Blocked(403)));

        assert!(prompt.contains("Access status: blocked (HTTP 403)"));
        assert!(prompt.contains("Do NOT invent"));
        assert!(prompt.contains("manual research is recommended"));

        let gathered = bundle(Provenance::Gathered, "Search snippets.");
        let prompt = build_analysis_prompt(&config(), &input(&gathered, AccessStatus::Timeout));

        assert!(prompt.contains("Don't default to LOW"));
        assert!(prompt.contains("Data provenance: gathered"));
    }

    #[test]
    fn test_prompt_includes_optional_sections() {
        let bundle = bundle(Provenance::Direct, "text");
        let mut input = input(&bundle, AccessStatus::Accessible);
        input.recent_news = Some("• Acme raises $20M Series A");
        input.api_docs = Some("API DOCS ANALYZED: Reference");

        let prompt = build_analysis_prompt(&config(), &input);

        assert!(prompt.contains("Acme raises $20M Series A"));
        assert!(prompt.contains("API DOCS ANALYZED: Reference"));
        assert!(!prompt.contains(NO_RECENT_NEWS));
    }

    #[test]
    fn test_report_message_carries_banner_and_limitations() {
        let direct = format_report_message("*THREAT LEVEL:* 🔴 HIGH", Provenance::Direct, AccessStatus::Accessible);
        assert_eq!(direct, format!("{REPORT_BANNER}\n\n*THREAT LEVEL:* 🔴 HIGH"));

        let failed = format_report_message("*THREAT LEVEL:* 🟡 MEDIUM", Provenance::Failed, AccessStatus::Blocked(403));
        assert!(failed.starts_with(REPORT_BANNER));
        assert!(failed.contains("Data limitations"));
        assert!(failed.contains("HTTP 403"));
        assert!(failed.contains("Manual research recommended"));
    }
}
