//! Hostex v3 API client.
//!
//! Implements the reservation, conversation and voucher collaborator traits
//! over HTTP. Every response is wrapped in an envelope
//! `{ request_id, error_code, error_msg, data }`; `error_code == 200` means
//! success regardless of the HTTP status.

use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::models::{
    Conversation, ConversationDetails, ConversationPage, Message, MessageSender, MessageType,
    NewVoucher, Reservation, ReservationBatch, ReservationQuery, Voucher, VoucherQuery,
};
use domain::services::{ConversationSource, ReservationSource, SourceError, VoucherSource};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::config::HostexConfig;

/// Header carrying the API access token.
pub const ACCESS_TOKEN_HEADER: &str = "Hostex-Access-Token";

/// `error_code` value of a successful response.
const SUCCESS_CODE: i64 = 200;

pub struct HostexClient {
    client: Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default = "success_code")]
    error_code: i64,
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

fn success_code() -> i64 {
    SUCCESS_CODE
}

/// Decoded `data` payload plus the upstream request id.
struct Success<T> {
    data: T,
    request_id: Option<String>,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ReservationList {
    #[serde(default)]
    reservations: Vec<serde_json::Value>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireGuest {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireProperty {
    #[serde(default)]
    id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireConversation {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    channel_type: Option<String>,
    #[serde(default)]
    last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    guest: Option<WireGuest>,
    #[serde(default)]
    property_id: Option<i64>,
    #[serde(default)]
    property: Option<WireProperty>,
    #[serde(default)]
    reservation_code: Option<String>,
    #[serde(default)]
    unread_count: u32,
}

impl From<WireConversation> for Conversation {
    fn from(wire: WireConversation) -> Self {
        Conversation {
            id: wire.id,
            reservation_code: wire.reservation_code.filter(|c| !c.is_empty()),
            guest_name: wire
                .guest
                .and_then(|g| g.name)
                .unwrap_or_else(|| "Unknown guest".to_string()),
            property_id: wire.property_id.or(wire.property.and_then(|p| p.id)),
            channel: wire.channel_type,
            last_message_at: wire.last_message_at,
            unread_count: wire.unread_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConversationList {
    #[serde(default)]
    conversations: Vec<serde_json::Value>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    sender_role: String,
    #[serde(default)]
    display_type: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    attachment: Option<WireAttachment>,
    created_at: DateTime<Utc>,
}

impl WireMessage {
    fn into_message(self, conversation_id: &str) -> Message {
        let sender = if self.sender_role.eq_ignore_ascii_case("host") {
            MessageSender::Host
        } else {
            MessageSender::Guest
        };
        let image_url = self.attachment.and_then(|a| a.url);
        let is_image = self
            .display_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("image"));

        Message {
            id: self.id,
            conversation_id: conversation_id.to_string(),
            content: self.content.unwrap_or_default(),
            sender,
            sent_at: self.created_at,
            message_type: if is_image {
                MessageType::Image
            } else {
                MessageType::Text
            },
            image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireConversationDetails {
    #[serde(flatten)]
    conversation: WireConversation,
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VoucherList {
    Plain(Vec<Voucher>),
    Wrapped {
        #[serde(default)]
        vouchers: Vec<Voucher>,
    },
}

#[derive(Debug, Deserialize)]
struct CreatedVoucher {
    id: i64,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Decodes each listing entry on its own; undecodable entries are logged and
/// dropped. Returns the decoded entries and the number dropped.
fn decode_entries<T: DeserializeOwned>(
    entries: Vec<serde_json::Value>,
    kind: &str,
) -> (Vec<T>, usize) {
    let mut decoded = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for entry in entries {
        match serde_json::from_value(entry) {
            Ok(item) => decoded.push(item),
            Err(e) => {
                skipped += 1;
                warn!(kind, error = %e, "Skipping malformed Hostex entry");
            }
        }
    }

    (decoded, skipped)
}

fn transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Network(err.to_string())
    }
}

// ============================================================================
// Client
// ============================================================================

impl HostexClient {
    pub fn new(config: &HostexConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Success<T>, SourceError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!(status = status.as_u16(), bytes = body.len(), "Hostex response");

        let envelope: Envelope = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(SourceError::Upstream {
                    message: format!("Hostex returned HTTP {}", status.as_u16()),
                    code: Some(i64::from(status.as_u16())),
                    request_id: None,
                });
            }
            Err(e) => {
                return Err(SourceError::InvalidResponse(format!(
                    "Malformed Hostex envelope: {}",
                    e
                )))
            }
        };

        if !status.is_success() || envelope.error_code != SUCCESS_CODE {
            return Err(SourceError::Upstream {
                message: envelope
                    .error_msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("Hostex returned HTTP {}", status.as_u16())),
                code: Some(envelope.error_code),
                request_id: envelope.request_id,
            });
        }

        let data = serde_json::from_value(envelope.data)
            .map_err(|e| SourceError::InvalidResponse(format!("Malformed Hostex data: {}", e)))?;

        Ok(Success {
            data,
            request_id: envelope.request_id,
        })
    }
}

#[async_trait::async_trait]
impl ReservationSource for HostexClient {
    async fn get_reservations(
        &self,
        query: &ReservationQuery,
    ) -> Result<ReservationBatch, SourceError> {
        let mut params: Vec<(&str, String)> = vec![
            ("offset", query.offset.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(date) = query.start_check_in_date {
            params.push(("start_check_in_date", date.to_string()));
        }
        if let Some(date) = query.end_check_in_date {
            params.push(("end_check_in_date", date.to_string()));
        }
        if let Some(property_id) = query.property_id {
            params.push(("property_id", property_id.to_string()));
        }

        let result: Success<ReservationList> = self
            .execute(self.request(Method::GET, "/reservations").query(&params))
            .await?;

        let (reservations, skipped) =
            decode_entries::<Reservation>(result.data.reservations, "reservation");

        Ok(ReservationBatch {
            reservations,
            request_id: result.request_id,
            total: result.data.total,
            skipped,
        })
    }
}

#[async_trait::async_trait]
impl ConversationSource for HostexClient {
    async fn get_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ConversationPage, SourceError> {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        let params = [("offset", offset.to_string()), ("limit", page_size.to_string())];

        let result: Success<ConversationList> = self
            .execute(self.request(Method::GET, "/conversations").query(&params))
            .await?;

        let (conversations, skipped) =
            decode_entries::<WireConversation>(result.data.conversations, "conversation");

        Ok(ConversationPage {
            conversations: conversations.into_iter().map(Conversation::from).collect(),
            total: result.data.total,
            skipped,
        })
    }

    async fn get_conversation_details(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationDetails, SourceError> {
        let path = format!("/conversations/{}", conversation_id);
        let result: Success<WireConversationDetails> =
            self.execute(self.request(Method::GET, &path)).await?;

        let conversation = Conversation::from(result.data.conversation);
        let messages = result
            .data
            .messages
            .into_iter()
            .map(|m| m.into_message(&conversation.id))
            .collect();

        Ok(ConversationDetails {
            conversation,
            messages,
        })
    }
}

#[async_trait::async_trait]
impl VoucherSource for HostexClient {
    async fn get_vouchers(&self, query: &VoucherQuery) -> Result<Vec<Voucher>, SourceError> {
        let params = [
            ("thirdparty_account_id", query.thirdparty_account_id.to_string()),
            ("page", query.page.to_string()),
            ("page_size", query.page_size.to_string()),
        ];

        let result: Success<VoucherList> = self
            .execute(self.request(Method::GET, "/vouchers").query(&params))
            .await?;

        Ok(match result.data {
            VoucherList::Plain(vouchers) => vouchers,
            VoucherList::Wrapped { vouchers } => vouchers,
        })
    }

    async fn create_voucher(&self, voucher: &NewVoucher) -> Result<i64, SourceError> {
        let result: Success<CreatedVoucher> = self
            .execute(self.request(Method::POST, "/vouchers").json(voucher))
            .await?;
        Ok(result.data.id)
    }

    async fn delete_voucher(
        &self,
        thirdparty_account_id: i64,
        voucher_id: i64,
    ) -> Result<(), SourceError> {
        let params = [
            ("thirdparty_account_id", thirdparty_account_id.to_string()),
            ("id", voucher_id.to_string()),
        ];

        let _: Success<serde_json::Value> = self
            .execute(self.request(Method::DELETE, "/vouchers").query(&params))
            .await?;
        Ok(())
    }
}
