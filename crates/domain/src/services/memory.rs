//! In-memory implementation of every upstream collaborator.
//!
//! Compiled for tests and, behind the `test-util` feature, for downstream
//! crates' tests. Failures can be injected per page, per conversation, per
//! voucher and per code.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::sources::{
    ConversationSource, LoyaltySource, ReservationSource, SourceError, VoucherSource,
};
use crate::models::{
    Conversation, ConversationDetails, ConversationPage, LoyaltyCard, LoyaltyQuery, Message,
    NewVoucher, Reservation, ReservationBatch, ReservationQuery, Voucher, VoucherQuery,
};

/// In-memory upstream with call recording and failure injection.
#[derive(Debug, Default)]
pub struct InMemorySource {
    reservations: Vec<Reservation>,
    reservation_error: Option<SourceError>,
    conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<Message>>,
    reported_total: Option<u64>,
    failing_pages: HashSet<u32>,
    failing_details: HashSet<String>,
    slow_details: HashSet<String>,
    vouchers: Mutex<HashMap<i64, Vec<Voucher>>>,
    failing_voucher_lists: HashSet<i64>,
    failing_deletes: HashSet<i64>,
    failing_creates: HashSet<String>,
    next_voucher_id: AtomicI64,
    loyalty_cards: Vec<LoyaltyCard>,
    loyalty_error: Option<SourceError>,
    calls: Mutex<Vec<String>>,
}

/// How long a "slow" conversation takes to answer.
pub const SLOW_DETAILS_DELAY: Duration = Duration::from_secs(60);

impl InMemorySource {
    pub fn new() -> Self {
        Self {
            next_voucher_id: AtomicI64::new(1000),
            ..Default::default()
        }
    }

    pub fn with_reservations(mut self, reservations: Vec<Reservation>) -> Self {
        self.reservations = reservations;
        self
    }

    pub fn failing_reservations(mut self, error: SourceError) -> Self {
        self.reservation_error = Some(error);
        self
    }

    pub fn with_conversation(mut self, conversation: Conversation, messages: Vec<Message>) -> Self {
        self.messages.insert(conversation.id.clone(), messages);
        self.conversations.push(conversation);
        self
    }

    /// Override the total reported by the conversation listing.
    pub fn with_reported_total(mut self, total: u64) -> Self {
        self.reported_total = Some(total);
        self
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    pub fn failing_details(mut self, conversation_id: &str) -> Self {
        self.failing_details.insert(conversation_id.to_string());
        self
    }

    /// Make a conversation's detail fetch take [`SLOW_DETAILS_DELAY`].
    pub fn slow_details(mut self, conversation_id: &str) -> Self {
        self.slow_details.insert(conversation_id.to_string());
        self
    }

    pub fn with_vouchers(self, thirdparty_account_id: i64, vouchers: Vec<Voucher>) -> Self {
        self.vouchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(thirdparty_account_id, vouchers);
        self
    }

    pub fn failing_voucher_list(mut self, thirdparty_account_id: i64) -> Self {
        self.failing_voucher_lists.insert(thirdparty_account_id);
        self
    }

    pub fn failing_delete(mut self, voucher_id: i64) -> Self {
        self.failing_deletes.insert(voucher_id);
        self
    }

    pub fn failing_create(mut self, code: &str) -> Self {
        self.failing_creates.insert(code.to_string());
        self
    }

    pub fn with_loyalty_cards(mut self, cards: Vec<LoyaltyCard>) -> Self {
        self.loyalty_cards = cards;
        self
    }

    pub fn failing_loyalty(mut self, error: SourceError) -> Self {
        self.loyalty_error = Some(error);
        self
    }

    /// Current vouchers of an account.
    pub fn vouchers_of(&self, thirdparty_account_id: i64) -> Vec<Voucher> {
        self.vouchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&thirdparty_account_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

#[async_trait::async_trait]
impl ReservationSource for InMemorySource {
    async fn get_reservations(
        &self,
        query: &ReservationQuery,
    ) -> Result<ReservationBatch, SourceError> {
        self.record(format!("get_reservations:{}", query.offset));
        if let Some(err) = &self.reservation_error {
            return Err(err.clone());
        }

        let matching: Vec<&Reservation> = self
            .reservations
            .iter()
            .filter(|r| query.start_check_in_date.map_or(true, |d| r.check_in_date >= d))
            .filter(|r| query.end_check_in_date.map_or(true, |d| r.check_in_date <= d))
            .filter(|r| query.property_id.map_or(true, |p| r.property_id == p))
            .collect();

        let limit = if query.limit == 0 { usize::MAX } else { query.limit as usize };
        let reservations = matching
            .iter()
            .skip(query.offset as usize)
            .take(limit)
            .map(|r| (*r).clone())
            .collect();

        Ok(ReservationBatch {
            reservations,
            request_id: Some("mem-request".to_string()),
            total: Some(matching.len() as u64),
            skipped: 0,
        })
    }
}

#[async_trait::async_trait]
impl ConversationSource for InMemorySource {
    async fn get_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ConversationPage, SourceError> {
        self.record(format!("get_conversations:{}", page));
        if self.failing_pages.contains(&page) {
            return Err(SourceError::Network(format!("page {} unavailable", page)));
        }

        let start = page.saturating_sub(1) as usize * page_size as usize;
        let conversations = self
            .conversations
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(ConversationPage {
            conversations,
            total: Some(
                self.reported_total
                    .unwrap_or(self.conversations.len() as u64),
            ),
            skipped: 0,
        })
    }

    async fn get_conversation_details(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationDetails, SourceError> {
        self.record(format!("get_conversation_details:{}", conversation_id));
        if self.slow_details.contains(conversation_id) {
            tokio::time::sleep(SLOW_DETAILS_DELAY).await;
        }
        if self.failing_details.contains(conversation_id) {
            return Err(SourceError::upstream(format!(
                "conversation {} unavailable",
                conversation_id
            )));
        }

        let conversation = self
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
            .ok_or_else(|| SourceError::upstream("conversation not found"))?;

        Ok(ConversationDetails {
            conversation,
            messages: self.messages.get(conversation_id).cloned().unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
impl VoucherSource for InMemorySource {
    async fn get_vouchers(&self, query: &VoucherQuery) -> Result<Vec<Voucher>, SourceError> {
        self.record(format!("get_vouchers:{}", query.thirdparty_account_id));
        if self.failing_voucher_lists.contains(&query.thirdparty_account_id) {
            return Err(SourceError::Network("voucher listing failed".into()));
        }

        let start = query.page.saturating_sub(1) as usize * query.page_size as usize;
        Ok(self
            .vouchers_of(query.thirdparty_account_id)
            .into_iter()
            .skip(start)
            .take(query.page_size as usize)
            .collect())
    }

    async fn create_voucher(&self, voucher: &NewVoucher) -> Result<i64, SourceError> {
        self.record(format!("create_voucher:{}", voucher.code));
        if self.failing_creates.contains(&voucher.code) {
            return Err(SourceError::upstream(format!(
                "cannot create voucher {}",
                voucher.code
            )));
        }

        let id = self.next_voucher_id.fetch_add(1, Ordering::SeqCst);
        self.vouchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(voucher.thirdparty_account_id)
            .or_default()
            .push(Voucher {
                id,
                code: voucher.code.clone(),
                discount: voucher.discount as f64,
                discount_type: voucher.discount_type,
                valid_from: voucher.earliest_check_in_date,
                valid_until: voucher.expires_at,
                minimum_nights: voucher.minimum_nights,
                redemption_count: voucher.redemption_count,
            });
        Ok(id)
    }

    async fn delete_voucher(
        &self,
        thirdparty_account_id: i64,
        voucher_id: i64,
    ) -> Result<(), SourceError> {
        self.record(format!("delete_voucher:{}", voucher_id));
        if self.failing_deletes.contains(&voucher_id) {
            return Err(SourceError::upstream(format!(
                "cannot delete voucher {}",
                voucher_id
            )));
        }

        if let Some(vouchers) = self
            .vouchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&thirdparty_account_id)
        {
            vouchers.retain(|v| v.id != voucher_id);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LoyaltySource for InMemorySource {
    async fn get_loyalty_cards(
        &self,
        _query: &LoyaltyQuery,
    ) -> Result<Vec<LoyaltyCard>, SourceError> {
        self.record("get_loyalty_cards".to_string());
        match &self.loyalty_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.loyalty_cards.clone()),
        }
    }
}
