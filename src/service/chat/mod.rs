pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Res, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat platforms
/// like Slack. Implementing this trait allows different chat services to be used
/// with rival-radar.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Start the chat client listener.
    ///
    /// This sets up event listeners for the chat platform and begins processing
    /// incoming reactions and commands.
    async fn start(&self) -> Void;

    /// Send a message to a channel thread.
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void;

    /// React to a message with an emoji.
    ///
    /// Used to show that an analysis is in progress, or finished.
    async fn react_to_message(&self, channel_id: &str, message_ts: &str, emoji: &str) -> Void;

    /// Remove a reaction the bot previously added.
    async fn remove_reaction(&self, channel_id: &str, message_ts: &str, emoji: &str) -> Void;

    /// Get the text of a single message.
    ///
    /// Returns `None` when the message exists but cannot be found in the
    /// channel (e.g., it was deleted before the lookup).
    async fn get_message_text(&self, channel_id: &str, message_ts: &str) -> Res<Option<String>>;

    /// Deliver a (delayed) reply to a slash command through its response URL.
    async fn respond_to_command(&self, response_url: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
