//! The analysis pipeline: fetch, extract or gather, prompt, and call the LLM.

use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        extract::{NO_TITLE, extract_content, find_api_doc_links, infer_company_name, truncate_chars},
        prompts::{PromptInput, build_analysis_prompt},
        types::{AnalysisError, AnalysisReport, ExtractedContent, IntelligenceBundle, Provenance, Res},
    },
    interaction::gather::Gatherer,
    service::{llm::LlmClient, news::NewsClient, search::SearchClient, web::WebClient},
};

/// API doc pages shorter than this are skipped.
const MIN_API_DOC_CHARS: usize = 500;
const API_DOC_EXCERPT_CHARS: usize = 1500;
const API_DOC_READ_CHARS: usize = 4000;

/// Everything needed to turn a URL into a report.
///
/// Cloneable; every client inside is an `Arc` wrapper. Each call to
/// [`Pipeline::analyze`] starts from scratch.
#[derive(Clone)]
pub struct Pipeline {
    pub config: Config,
    pub web: WebClient,
    pub search: SearchClient,
    pub news: NewsClient,
    pub llm: LlmClient,
}

impl Pipeline {
    /// Build the pipeline with the production clients.
    pub fn new(config: &Config) -> Res<Self> {
        Ok(Self {
            config: config.clone(),
            web: WebClient::new(config)?,
            search: SearchClient::new(config),
            news: NewsClient::new(config),
            llm: LlmClient::openai(config),
        })
    }

    /// Analyze a single URL.
    ///
    /// Fetch and gathering failures degrade into weaker provenance; only an
    /// LLM failure is returned as an error.
    #[instrument(name = "Pipeline::analyze", skip(self))]
    pub async fn analyze(&self, url: &str) -> Result<AnalysisReport, AnalysisError> {
        info!("Fetching {url} ...");

        let fetch = self.web.fetch(url).await;
        let access_status = fetch.access_status();

        if let Some(err) = fetch.error() {
            warn!("Direct fetch failed: {err}");
        }

        let body = fetch.body.as_deref().filter(|_| fetch.is_success());

        let extracted = match body {
            Some(html) => extract_content(html, &fetch.url, self.config.content_char_budget),
            None => ExtractedContent {
                title: None,
                text: String::new(),
                company_name: infer_company_name(None, url),
            },
        };

        info!("Detected company name: {}", extracted.company_name);

        let chars = extracted.text.chars().count();

        let bundle = if chars >= self.config.min_content_chars {
            info!("Extracted {chars} chars directly.");

            IntelligenceBundle {
                provenance: Provenance::Direct,
                text: extracted.text.clone(),
                sources: vec![fetch.url.clone()],
            }
        } else {
            if body.is_some() {
                warn!("{}", AnalysisError::ParseEmpty { chars });
            }

            info!("Gathering fallback intelligence ...");

            Gatherer::new(&self.config, &self.web, &self.search).gather(url, &extracted.company_name, &extracted.text).await
        };

        let recent_news = self.news.recent_news(&extracted.company_name).await;

        let api_docs = match body {
            Some(html) if self.config.analyze_api_docs => self.api_docs(html, &fetch.url).await,
            _ => None,
        };

        info!("Building prompt ({} provenance) ...", bundle.provenance);

        let prompt = build_analysis_prompt(
            &self.config,
            &PromptInput {
                url,
                title: extracted.title.as_deref().unwrap_or(NO_TITLE),
                company_name: &extracted.company_name,
                access_status,
                bundle: &bundle,
                recent_news: recent_news.as_deref(),
                api_docs: api_docs.as_deref(),
            },
        );

        info!("Calling the LLM ...");

        let text = self.llm.complete(&prompt).await.map_err(|err| AnalysisError::LlmCallFailed(err.to_string()))?;

        info!("Analysis complete.");

        Ok(AnalysisReport {
            url: url.to_string(),
            company_name: extracted.company_name,
            provenance: bundle.provenance,
            access_status,
            text,
        })
    }

    /// Excerpt the first linked API documentation page with real content.
    async fn api_docs(&self, html: &str, page_url: &str) -> Option<String> {
        let links = find_api_doc_links(html, page_url);
        info!("Found {} potential API doc links.", links.len());

        for link in links {
            let result = self.web.probe(&link).await;
            let Some(body) = result.body.as_deref().filter(|_| result.is_success()) else {
                continue;
            };

            let doc = extract_content(body, &link, API_DOC_READ_CHARS);

            if doc.text.chars().count() > MIN_API_DOC_CHARS {
                let title = doc.title.as_deref().unwrap_or("API Docs");
                return Some(format!("API DOCS ANALYZED: {title}\nURL: {link}\nContent: {}", truncate_chars(&doc.text, API_DOC_EXCERPT_CHARS)));
            }
        }

        warn!("No substantial API documentation found.");

        None
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::{
        base::{config::ConfigInner, types::AccessStatus},
        service::{llm::GenericLlmClient, web::retry::RetryPolicy},
    };

    /// Records prompts and answers with a canned report.
    #[derive(Default)]
    struct RecordingLlm {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenericLlmClient for RecordingLlm {
        async fn complete(&self, prompt: &str) -> Res<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("*THREAT LEVEL:* 🟡 MEDIUM".to_string())
        }
    }

    fn pipeline(server: &MockServer, analyze_api_docs: bool, llm: Arc<RecordingLlm>) -> Pipeline {
        let config = Config {
            inner: Arc::new(ConfigInner {
                probe_domain_guesses: false,
                profile_url_template: format!("{}/company/{{slug}}/about/", server.uri()),
                analyze_api_docs,
                ..Default::default()
            }),
        };

        Pipeline {
            web: WebClient::with_settings(Duration::from_secs(5), Duration::ZERO, RetryPolicy::once(), RetryPolicy::once()).unwrap(),
            search: SearchClient::default(),
            news: NewsClient::with_endpoint(None, server.uri()),
            llm: LlmClient::new(llm),
            config,
        }
    }

    #[tokio::test]
    async fn test_direct_content_reaches_the_prompt() {
        let server = MockServer::start().await;
        let body = format!("<html><head><title>Acme | Invoicing</title></head><body><p>{}</p></body></html>", "Acme automates payables. ".repeat(10));
        Mock::given(method("GET")).and(path("/")).respond_with(ResponseTemplate::new(200).set_body_string(body)).expect(1).mount(&server).await;

        let llm = Arc::new(RecordingLlm::default());
        let report = pipeline(&server, false, llm.clone()).analyze(&format!("{}/", server.uri())).await.unwrap();

        assert_eq!(report.company_name, "Acme");
        assert_eq!(report.provenance, Provenance::Direct);
        assert_eq!(report.access_status, AccessStatus::Accessible);
        assert_eq!(report.text, "*THREAT LEVEL:* 🟡 MEDIUM");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Acme automates payables."));
        assert!(prompts[0].contains("Title: Acme | Invoicing"));
    }

    #[tokio::test]
    async fn test_api_docs_are_excerpted_when_enabled() {
        let server = MockServer::start().await;
        let home = format!(
            "<html><head><title>Acme</title></head><body><a href=\"/developers\">Developers</a><p>{}</p></body></html>",
            "Acme automates payables. ".repeat(10)
        );
        let docs = format!("<html><head><title>Acme API Reference</title></head><body><p>{}</p></body></html>", "POST /v1/payables creates a payable. ".repeat(20));
        Mock::given(method("GET")).and(path("/")).respond_with(ResponseTemplate::new(200).set_body_string(home)).mount(&server).await;
        Mock::given(method("GET")).and(path("/developers")).respond_with(ResponseTemplate::new(200).set_body_string(docs)).expect(1).mount(&server).await;

        let llm = Arc::new(RecordingLlm::default());
        pipeline(&server, true, llm.clone()).analyze(&format!("{}/", server.uri())).await.unwrap();

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("API DOCS ANALYZED: Acme API Reference"));
        assert!(prompts[0].contains("POST /v1/payables"));
    }

    #[tokio::test]
    async fn test_llm_failure_is_an_error() {
        struct FailingLlm;

        #[async_trait]
        impl GenericLlmClient for FailingLlm {
            async fn complete(&self, _prompt: &str) -> Res<String> {
                Err(anyhow::anyhow!("rate limited"))
            }
        }

        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(403)).mount(&server).await;

        let mut pipeline = pipeline(&server, false, Arc::new(RecordingLlm::default()));
        pipeline.llm = LlmClient::new(Arc::new(FailingLlm));

        let err = pipeline.analyze(&server.uri()).await.unwrap_err();

        assert!(matches!(err, AnalysisError::LlmCallFailed(ref msg) if msg.contains("rate limited")));
    }
}
