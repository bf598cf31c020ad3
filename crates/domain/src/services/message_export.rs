//! Flat plain-text export of all guest/host conversations.
//!
//! Conversations are paged through sequentially, each conversation's messages
//! are fetched with a timeout, filtered against an optional cutoff date and
//! rendered into one fixed-width transcript. Page and conversation failures
//! are isolated: the export always returns whatever could be gathered and
//! reports what was lost.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use tokio::time::Instant;
use tracing::{info, warn};

use super::sources::{ConversationSource, SourceError};
use crate::models::{Conversation, Message, MessageType};
use shared::pagination::PageWalk;
use shared::text::{center, rule, wrap_text};

/// Conversations requested per listing page.
pub const EXPORT_PAGE_SIZE: u32 = 100;

/// Width of the rendered transcript.
pub const LINE_WIDTH: usize = 120;

/// Default timeout for fetching one conversation's messages.
pub const DEFAULT_CONVERSATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Messages sent before this date (UTC midnight) are excluded.
    pub cutoff: Option<NaiveDate>,
    pub conversation_timeout: Duration,
    pub page_size: u32,
    /// Total time budget for fetching messages. Conversations not reached
    /// in time count as failed and the export is returned as partial.
    pub deadline: Option<Duration>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            cutoff: None,
            conversation_timeout: DEFAULT_CONVERSATION_TIMEOUT,
            page_size: EXPORT_PAGE_SIZE,
            deadline: None,
        }
    }
}

/// A conversation with its filtered, ordered messages.
#[derive(Debug, Clone)]
pub struct ExportedConversation {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Result of an export run.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub text: String,
    pub conversations: usize,
    pub messages: usize,
    pub pages_fetched: u32,
    pub failed_pages: u32,
    pub failed_conversations: u32,
}

impl ExportOutcome {
    /// Whether any page or conversation could not be fetched.
    pub fn is_partial(&self) -> bool {
        self.failed_pages > 0 || self.failed_conversations > 0
    }
}

/// Conversations discovered by paging through the listing.
struct Listing {
    conversations: Vec<Conversation>,
    pages_fetched: u32,
    failed_pages: u32,
    /// Listing entries that could not be decoded.
    failed_entries: u32,
}

async fn list_conversations(source: &dyn ConversationSource, page_size: u32) -> Listing {
    let mut walk = PageWalk::new(page_size);
    let mut conversations = Vec::new();
    let mut failed_pages = 0;
    let mut failed_entries = 0;

    while let Some(page) = walk.next_page() {
        match source.get_conversations(page, walk.page_size()).await {
            Ok(result) => {
                walk.record(result.page_len(), result.total);
                if result.skipped > 0 {
                    warn!(page = page, skipped = result.skipped, "Dropped undecodable conversations");
                    failed_entries += result.skipped as u32;
                }
                conversations.extend(result.conversations);
            }
            Err(e) => {
                // The page counts as empty and ends the walk.
                warn!(page = page, error = %e, "Failed to fetch conversation page");
                failed_pages += 1;
                walk.abort();
            }
        }
    }

    Listing {
        conversations,
        pages_fetched: walk.pages_fetched(),
        failed_pages,
        failed_entries,
    }
}

fn cutoff_instant(cutoff: NaiveDate) -> DateTime<Utc> {
    cutoff.and_time(NaiveTime::MIN).and_utc()
}

/// Sorts messages ascending by send time and drops those before `cutoff`.
pub fn prepare_messages(mut messages: Vec<Message>, cutoff: Option<NaiveDate>) -> Vec<Message> {
    if let Some(cutoff) = cutoff {
        let threshold = cutoff_instant(cutoff);
        messages.retain(|m| m.sent_at >= threshold);
    }
    messages.sort_by_key(|m| m.sent_at);
    messages
}

async fn fetch_messages(
    source: &dyn ConversationSource,
    conversation_id: &str,
    timeout: Duration,
) -> Result<Vec<Message>, SourceError> {
    match tokio::time::timeout(timeout, source.get_conversation_details(conversation_id)).await {
        Ok(result) => result.map(|details| details.messages),
        Err(_) => Err(SourceError::Timeout),
    }
}

/// Builds the full transcript of every conversation reachable through
/// `source`.
pub async fn export_messages(
    source: &dyn ConversationSource,
    options: &ExportOptions,
    generated_at: DateTime<Utc>,
) -> ExportOutcome {
    let started = Instant::now();
    let listing = list_conversations(source, options.page_size).await;
    info!(
        conversations = listing.conversations.len(),
        pages = listing.pages_fetched,
        "Collected conversations for export"
    );

    let mut exported = Vec::new();
    let mut failed_conversations = listing.failed_entries;
    let total = listing.conversations.len();

    for (index, conversation) in listing.conversations.into_iter().enumerate() {
        let remaining = options
            .deadline
            .map(|deadline| deadline.saturating_sub(started.elapsed()));
        if remaining.is_some_and(|r| r.is_zero()) {
            let abandoned = (total - index) as u32;
            warn!(abandoned, "Export deadline reached, skipping remaining conversations");
            failed_conversations += abandoned;
            break;
        }
        let timeout = remaining.map_or(options.conversation_timeout, |r| {
            r.min(options.conversation_timeout)
        });

        let messages = match fetch_messages(source, &conversation.id, timeout).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(
                    conversation_id = %conversation.id,
                    error = %e,
                    "Failed to fetch conversation messages"
                );
                failed_conversations += 1;
                continue;
            }
        };

        let messages = prepare_messages(messages, options.cutoff);
        if messages.is_empty() {
            continue;
        }

        exported.push(ExportedConversation {
            conversation,
            messages,
        });
    }

    let summary = ExportSummary {
        generated_at,
        cutoff: options.cutoff,
        conversations: exported.len(),
        messages: exported.iter().map(|c| c.messages.len()).sum(),
        failed_pages: listing.failed_pages,
        failed_conversations,
    };
    let text = render_export(&exported, &summary);

    info!(
        conversations = summary.conversations,
        messages = summary.messages,
        failed_pages = summary.failed_pages,
        failed_conversations = summary.failed_conversations,
        "Message export finished"
    );

    ExportOutcome {
        text,
        conversations: summary.conversations,
        messages: summary.messages,
        pages_fetched: listing.pages_fetched,
        failed_pages: listing.failed_pages,
        failed_conversations,
    }
}

/// Header data of a rendered export.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub generated_at: DateTime<Utc>,
    pub cutoff: Option<NaiveDate>,
    pub conversations: usize,
    pub messages: usize,
    pub failed_pages: u32,
    pub failed_conversations: u32,
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Renders the transcript text.
pub fn render_export(conversations: &[ExportedConversation], summary: &ExportSummary) -> String {
    let banner = rule('=', LINE_WIDTH);
    let divider = rule('-', LINE_WIDTH);
    let mut out: Vec<String> = Vec::new();

    out.push(banner.clone());
    out.push(center("HOSTEX MESSAGES EXPORT", LINE_WIDTH));
    out.push(banner.clone());
    out.push(format!("Generated at: {}", iso(summary.generated_at)));
    match summary.cutoff {
        Some(cutoff) => out.push(format!(
            "Cutoff date: {} (earlier messages excluded)",
            cutoff
        )),
        None => out.push("Cutoff date: none".to_string()),
    }
    out.push(format!("Total conversations: {}", summary.conversations));
    out.push(format!("Total messages: {}", summary.messages));
    if summary.failed_pages > 0 || summary.failed_conversations > 0 {
        out.push(format!(
            "Partial export: {} page(s) and {} conversation(s) could not be fetched",
            summary.failed_pages, summary.failed_conversations
        ));
    }
    out.push(banner.clone());
    out.push(String::new());

    for exported in conversations {
        let c = &exported.conversation;
        out.push(divider.clone());
        out.push(format!("Conversation: {}", c.id));
        out.push(format!("Guest: {}", c.guest_name));
        out.push(format!("Property: {}", or_na(c.property_id)));
        out.push(format!("Reservation: {}", or_na(c.reservation_code.as_deref())));
        out.push(format!("Channel: {}", or_na(c.channel.as_deref())));
        out.push(format!("Last message at: {}", or_na(c.last_message_at.map(iso))));
        out.push(format!("Messages: {}", exported.messages.len()));
        out.push(divider.clone());
        out.push(String::new());

        for message in &exported.messages {
            out.push(format!("{} {}", message.sender.label(), iso(message.sent_at)));
            if message.message_type == MessageType::Image {
                out.push(format!("[IMAGE]: {}", or_na(message.image_url.as_deref())));
            }
            out.extend(wrap_text(&message.content, LINE_WIDTH));
            out.push(String::new());
        }
    }

    out.push(banner.clone());
    out.push(center("END OF EXPORT", LINE_WIDTH));
    out.push(banner);

    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageSender;
    use crate::services::memory::InMemorySource;
    use crate::services::testing::{conversation, date, message, ts};

    fn generated_at() -> DateTime<Utc> {
        ts("2024-07-01T08:00:00Z")
    }

    fn source_with_conversations(count: usize) -> InMemorySource {
        (0..count).fold(InMemorySource::new(), |source, i| {
            let id = format!("c{}", i);
            let msg = message(&id, "m1", MessageSender::Guest, "2024-06-01T10:00:00Z", "Hi");
            source.with_conversation(conversation(&id), vec![msg])
        })
    }

    #[tokio::test]
    async fn test_pagination_stops_after_short_page() {
        let source = source_with_conversations(237);

        let outcome = export_messages(&source, &ExportOptions::default(), generated_at()).await;

        assert_eq!(source.calls_matching("get_conversations"), 3);
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.conversations, 237);
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn test_pagination_stops_when_total_reached() {
        let source = source_with_conversations(200);

        let outcome = export_messages(&source, &ExportOptions::default(), generated_at()).await;

        // Two full pages reach the reported total; no empty third page is requested.
        assert_eq!(source.calls_matching("get_conversations"), 2);
        assert_eq!(outcome.conversations, 200);
    }

    #[tokio::test]
    async fn test_page_failure_stops_pagination_and_flags_partial() {
        let source = source_with_conversations(250).failing_page(2);

        let outcome = export_messages(&source, &ExportOptions::default(), generated_at()).await;

        assert_eq!(source.calls_matching("get_conversations"), 2);
        assert_eq!(outcome.conversations, 100);
        assert_eq!(outcome.failed_pages, 1);
        assert!(outcome.is_partial());
        assert!(outcome.text.contains("Partial export: 1 page(s)"));
    }

    #[tokio::test]
    async fn test_unreachable_source_yields_empty_export() {
        let source = InMemorySource::new().failing_page(1);

        let outcome = export_messages(&source, &ExportOptions::default(), generated_at()).await;

        assert_eq!(outcome.conversations, 0);
        assert!(outcome.text.contains("Total conversations: 0"));
    }

    #[tokio::test]
    async fn test_failed_conversation_does_not_block_others() {
        let source = source_with_conversations(3).failing_details("c1");

        let outcome = export_messages(&source, &ExportOptions::default(), generated_at()).await;

        assert_eq!(outcome.conversations, 2);
        assert_eq!(outcome.failed_conversations, 1);
        assert!(outcome.text.contains("Conversation: c0"));
        assert!(!outcome.text.contains("Conversation: c1"));
        assert!(outcome.text.contains("Conversation: c2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_conversation_times_out() {
        let source = source_with_conversations(2).slow_details("c0");

        let outcome = export_messages(&source, &ExportOptions::default(), generated_at()).await;

        assert_eq!(outcome.conversations, 1);
        assert_eq!(outcome.failed_conversations, 1);
        assert!(outcome.text.contains("Conversation: c1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_returns_partial_export() {
        let source = source_with_conversations(4)
            .slow_details("c1")
            .slow_details("c2");
        let options = ExportOptions {
            deadline: Some(Duration::from_secs(15)),
            ..Default::default()
        };

        let outcome = export_messages(&source, &options, generated_at()).await;

        // c1 uses its full 10 s, c2 gets the remaining 5 s, c3 is never fetched.
        assert_eq!(outcome.conversations, 1);
        assert_eq!(outcome.failed_conversations, 3);
        assert!(outcome.is_partial());
        assert!(outcome.text.contains("Conversation: c0"));
        assert!(!outcome.text.contains("Conversation: c3"));
        assert_eq!(source.calls_matching("get_conversation_details"), 3);
    }

    #[tokio::test]
    async fn test_cutoff_filters_messages_and_empty_conversations() {
        let old_only = vec![message(
            "old",
            "m1",
            MessageSender::Guest,
            "2023-12-31T23:59:59Z",
            "too old",
        )];
        let mixed = vec![
            message("mixed", "m2", MessageSender::Host, "2024-01-02T09:00:00Z", "recent"),
            message("mixed", "m1", MessageSender::Guest, "2023-11-01T09:00:00Z", "ancient"),
            message("mixed", "m3", MessageSender::Guest, "2024-01-01T00:00:00Z", "boundary"),
        ];
        let source = InMemorySource::new()
            .with_conversation(conversation("old"), old_only)
            .with_conversation(conversation("mixed"), mixed);
        let options = ExportOptions {
            cutoff: Some(date(2024, 1, 1)),
            ..Default::default()
        };

        let outcome = export_messages(&source, &options, generated_at()).await;

        assert_eq!(outcome.conversations, 1);
        assert_eq!(outcome.messages, 2);
        assert!(!outcome.text.contains("Conversation: old"));
        assert!(!outcome.text.contains("ancient"));
        assert!(!outcome.text.contains("too old"));
        assert!(outcome.text.contains("Cutoff date: 2024-01-01"));

        // Boundary message (exactly at cutoff) comes first, then the later one.
        let boundary = outcome.text.find("boundary").unwrap();
        let recent = outcome.text.find("recent").unwrap();
        assert!(boundary < recent);
    }

    #[test]
    fn test_prepare_messages_sorts_ascending() {
        let messages = vec![
            message("c", "b", MessageSender::Host, "2024-06-02T10:00:00Z", "second"),
            message("c", "a", MessageSender::Guest, "2024-06-01T10:00:00Z", "first"),
        ];
        let prepared = prepare_messages(messages, None);
        assert_eq!(prepared[0].id, "a");
        assert_eq!(prepared[1].id, "b");
    }

    #[test]
    fn test_render_message_lines() {
        let mut image = message("c", "m2", MessageSender::Host, "2024-06-01T11:00:00Z", "");
        image.message_type = MessageType::Image;
        image.image_url = Some("https://cdn.example.com/a.jpg".into());
        let long_word = "z".repeat(130);
        let conversations = vec![ExportedConversation {
            conversation: conversation("c"),
            messages: vec![
                message("c", "m1", MessageSender::Guest, "2024-06-01T10:00:00Z", &long_word),
                image,
            ],
        }];
        let summary = ExportSummary {
            generated_at: generated_at(),
            cutoff: None,
            conversations: 1,
            messages: 2,
            failed_pages: 0,
            failed_conversations: 0,
        };

        let text = render_export(&conversations, &summary);

        assert!(text.contains("[GUEST] 2024-06-01T10:00:00.000Z"));
        assert!(text.contains("[HOST] 2024-06-01T11:00:00.000Z"));
        assert!(text.contains("[IMAGE]: https://cdn.example.com/a.jpg"));
        assert!(text.lines().any(|l| l == long_word));
        assert!(text.contains("Cutoff date: none"));
        assert!(text.contains("Reservation: RES-c"));
        assert!(text.contains("END OF EXPORT"));
        assert!(!text.contains("Partial export"));
    }

    #[test]
    fn test_render_wraps_at_line_width() {
        let body = "word ".repeat(100);
        let conversations = vec![ExportedConversation {
            conversation: conversation("c"),
            messages: vec![message("c", "m1", MessageSender::Guest, "2024-06-01T10:00:00Z", &body)],
        }];
        let summary = ExportSummary {
            generated_at: generated_at(),
            cutoff: None,
            conversations: 1,
            messages: 1,
            failed_pages: 0,
            failed_conversations: 0,
        };

        let text = render_export(&conversations, &summary);
        assert!(text.lines().all(|l| l.chars().count() <= LINE_WIDTH));
    }
}
