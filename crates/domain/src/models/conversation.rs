//! Guest/host conversation and message models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A guest-host message thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub reservation_code: Option<String>,
    pub guest_name: String,
    pub property_id: Option<i64>,
    pub channel: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: u32,
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Host,
    Guest,
}

impl MessageSender {
    /// Label used in plain-text exports.
    pub fn label(&self) -> &'static str {
        match self {
            MessageSender::Host => "[HOST]",
            MessageSender::Guest => "[GUEST]",
        }
    }
}

impl fmt::Display for MessageSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSender::Host => write!(f, "host"),
            MessageSender::Guest => write!(f, "guest"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
}

/// A single message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub sender: MessageSender,
    pub sent_at: DateTime<Utc>,
    pub message_type: MessageType,
    pub image_url: Option<String>,
}

/// A conversation together with its full message list.
#[derive(Debug, Clone)]
pub struct ConversationDetails {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// One page of the conversation listing.
#[derive(Debug, Clone, Default)]
pub struct ConversationPage {
    pub conversations: Vec<Conversation>,
    /// Server-reported total across all pages, when available.
    pub total: Option<u64>,
    /// Entries on the page that could not be decoded and were dropped.
    pub skipped: usize,
}

impl ConversationPage {
    /// Number of entries the upstream page held, decodable or not.
    pub fn page_len(&self) -> usize {
        self.conversations.len() + self.skipped
    }
}
