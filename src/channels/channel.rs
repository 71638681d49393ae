//! Channel trait and message types shared by every transport.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChannelError;
use crate::form::schema::ChoiceOption;

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Free-form text.
    Text { text: String },
    /// A pressed button. `generation` is the session generation the button
    /// was issued in, when the transport tracks it.
    Choice {
        tag: String,
        #[serde(default)]
        generation: Option<u64>,
    },
}

/// An inbound message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name, e.g. "cli".
    pub channel: String,
    /// Stable per-user identifier; sessions are keyed by it.
    pub user_id: String,
    pub content: MessageContent,
    pub received_at: DateTime<Utc>,
    /// Transport-specific data (chat ids and the like).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    /// A text message.
    pub fn new(channel: &str, user_id: &str, text: &str) -> Self {
        Self::with_content(
            channel,
            user_id,
            MessageContent::Text {
                text: text.to_string(),
            },
        )
    }

    /// A button press.
    pub fn choice(channel: &str, user_id: &str, tag: &str, generation: Option<u64>) -> Self {
        Self::with_content(
            channel,
            user_id,
            MessageContent::Choice {
                tag: tag.to_string(),
                generation,
            },
        )
    }

    fn with_content(channel: &str, user_id: &str, content: MessageContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            content,
            received_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A button offered with a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseChoice {
    pub tag: String,
    pub label: String,
}

impl From<&ChoiceOption> for ResponseChoice {
    fn from(option: &ChoiceOption) -> Self {
        Self {
            tag: option.tag.to_string(),
            label: option.label.to_string(),
        }
    }
}

/// An outbound message to a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingResponse {
    pub content: String,
    /// Buttons to show, in order. Empty for plain messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ResponseChoice>,
    /// A rendered document to deliver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<PathBuf>,
    /// Session generation the choices belong to.
    pub generation: u64,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_choices(mut self, choices: Vec<ResponseChoice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_attachment(mut self, path: PathBuf) -> Self {
        self.attachment = Some(path);
        self
    }
}

/// Stream of inbound messages produced by [`Channel::start`].
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A message transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver a response to the sender of `msg`.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}
