//! Slack integration for rival-radar.
//!
//! Socket mode listener for reaction and slash-command triggers, plus the
//! outbound calls the responder needs (thread replies, reactions, message
//! lookups and command response URLs).

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use serde::Serialize;
use slack_morphism::prelude::*;
use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{self, analysis::Pipeline},
};

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, pipeline: Pipeline) -> Res<Self> {
        let client = SlackChatClient::new(config, pipeline).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    config: Config,
    pipeline: Pipeline,
    chat: ChatClient,
    bot_user_id: String,
}

/// Body posted to a slash command's `response_url`.
#[derive(Serialize)]
struct CommandReply<'a> {
    response_type: &'static str,
    replace_original: bool,
    text: &'a str,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    pub app_token: SlackApiToken,
    pub bot_token: SlackApiToken,
    pub bot_user_id: String,
    pub client: Arc<FullClient>,
    pub http: reqwest::Client,
    pub config: Config,
    pub pipeline: Pipeline,
}

impl Deref for SlackChatClient {
    type Target = FullClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, pipeline: Pipeline) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Get the bot's user ID (also validates the bot token).

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            client,
            http: reqwest::Client::new(),
            config: config.clone(),
            pipeline,
        })
    }

    /// Find a message with the exact timestamp among `messages`.
    fn find_text(messages: &[SlackHistoryMessage], message_ts: &str) -> Option<String> {
        messages.iter().find(|m| m.origin.ts.0 == message_ts).map(|m| m.content.text.clone().unwrap_or_default())
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new().with_command_events(handle_command_event).with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            config: self.config.clone(),
            pipeline: self.pipeline.clone(),
            chat: ChatClient::from(self.clone()),
            bot_user_id: self.bot_user_id.clone(),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events.
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Serve until Ctrl-C.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message)
            .with_thread_ts(SlackTs(thread_ts.to_string()))
            .with_unfurl_links(false);

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn react_to_message(&self, channel_id: &str, message_ts: &str, emoji: &str) -> Void {
        let request = SlackApiReactionsAddRequest {
            channel: SlackChannelId(channel_id.to_string()),
            name: SlackReactionName(emoji.to_string()),
            timestamp: SlackTs(message_ts.to_string()),
        };

        let session = self.client.open_session(&self.bot_token);

        let _ = session.reactions_add(&request).await.map_err(|e| anyhow::anyhow!("Failed to react to message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_reaction(&self, channel_id: &str, message_ts: &str, emoji: &str) -> Void {
        let request = SlackApiReactionsRemoveRequest::new(SlackReactionName(emoji.to_string()))
            .with_channel(SlackChannelId(channel_id.to_string()))
            .with_timestamp(SlackTs(message_ts.to_string()));

        let session = self.client.open_session(&self.bot_token);

        let _ = session.reactions_remove(&request).await.map_err(|e| anyhow::anyhow!("Failed to remove reaction: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_message_text(&self, channel_id: &str, message_ts: &str) -> Res<Option<String>> {
        let session = self.client.open_session(&self.bot_token);

        // Top-level messages come back from the channel history.

        let request = SlackApiConversationsHistoryRequest::new()
            .with_channel(SlackChannelId(channel_id.to_string()))
            .with_latest(SlackTs(message_ts.to_string()))
            .with_inclusive(true)
            .with_limit(1);

        let response = session.conversations_history(&request).await?;

        if let Some(text) = Self::find_text(&response.messages, message_ts) {
            return Ok(Some(text));
        }

        // Thread replies are not part of the history, so look them up directly.

        let request = SlackApiConversationsRepliesRequest::new(SlackChannelId(channel_id.to_string()), SlackTs(message_ts.to_string()))
            .with_latest(SlackTs(message_ts.to_string()))
            .with_inclusive(true)
            .with_limit(1);

        match session.conversations_replies(&request).await {
            Ok(response) => Ok(Self::find_text(&response.messages, message_ts)),
            Err(err) => {
                warn!("Reply lookup for {message_ts} failed: {err}");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, text))]
    async fn respond_to_command(&self, response_url: &str, text: &str) -> Void {
        let body = CommandReply {
            response_type: "in_channel",
            replace_original: false,
            text,
        };

        let response = self.http.post(response_url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Slack rejected the command response: HTTP {}", response.status()));
        }

        Ok(())
    }
}

// Socket mode listener callbacks for Slack.

/// Handles slash command events from Slack.
///
/// The command is acknowledged right away; the report arrives later through the response URL.
#[instrument(skip_all)]
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    let ack = |text: String| SlackCommandEventResponse::new(SlackMessageContent::new().with_text(text)).with_response_type(SlackMessageResponseType::Ephemeral);

    if event.command.0 != user_state.config.slash_command {
        warn!("Received unknown command `{}`.", event.command.0);
        return Ok(ack(format!("Unknown command `{}`.", event.command.0)));
    }

    info!("Received command event ...");

    let text = event.text.clone().unwrap_or_default();
    let channel_id = event.channel_id.0.clone();
    let response_url = event.response_url.0.to_string();

    let reply = interaction::command::handle_command(text, channel_id, response_url, user_state.pipeline.clone(), user_state.chat.clone());

    Ok(ack(reply))
}

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let event = event_callback.event;
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    match event {
        SlackEventCallbackBody::ReactionAdded(reaction_event) => {
            if reaction_event.reaction.0 != user_state.config.trigger_reaction {
                return Ok(());
            }

            if reaction_event.user.0 == user_state.bot_user_id {
                warn!("Skipping reaction added by the bot itself.");
                return Ok(());
            }

            let SlackReactionsItem::Message(message) = &reaction_event.item else {
                warn!("Skipping trigger reaction on a non-message item.");
                return Ok(());
            };

            let channel_id = message.origin.channel.as_ref().ok_or(anyhow::anyhow!("Failed to get channel ID"))?.0.to_owned();
            let message_ts = message.origin.ts.0.to_owned();

            info!("Received trigger reaction ...");

            interaction::reaction::handle_reaction(channel_id, message_ts, user_state.pipeline.clone(), user_state.chat.clone());
        }
        _ => {
            warn!("Received unhandled push event.")
        }
    }

    Ok(())
}
