//! OpenAI chat completions backend for the threat assessment.
//!
//! A single request is made per analysis, bounded by a hard timeout. Any
//! OpenAI-compatible endpoint can be targeted through `openai_base_url`.

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{info, instrument};

use crate::base::{
    config::{Config, ConfigInner},
    types::Res,
};

use super::{GenericLlmClient, LlmClient};

/// OpenAI can be slow on long prompts.
const TIMEOUT: Duration = Duration::from_secs(120);

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let mut cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        if let Some(base) = ConfigInner::optional_key(&config.openai_base_url) {
            cfg = cfg.with_api_base(base.trim_end_matches('/'));
        }

        // The client retries 429s and 5xx by default; one attempt per analysis.
        let no_retry = backoff::ExponentialBackoffBuilder::new().with_max_elapsed_time(Some(Duration::ZERO)).build();

        Self {
            client: Client::with_config(cfg).with_backoff(no_retry),
            config: config.clone(),
        }
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::complete", skip_all, fields(model = %self.config.openai_model))]
    async fn complete(&self, prompt: &str) -> Res<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.openai_model)
            .max_completion_tokens(self.config.openai_max_tokens)
            .messages(vec![ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessageArgs::default().content(prompt).build()?)])
            .build()?;

        let response = timeout(TIMEOUT, self.client.chat().create(request))
            .await
            .map_err(|_| anyhow::anyhow!("OpenAI API call timed out after {}s", TIMEOUT.as_secs()))?
            .map_err(|err| anyhow::anyhow!("OpenAI API call failed: {err}"))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("OpenAI returned no content"))?;

        info!("OpenAI returned {} characters.", text.len());

        Ok(text)
    }
}

// Tests.
