//! Collaborator traits for upstream data sources.
//!
//! The property-management API (reservations, conversations, vouchers) and
//! the CRM (loyalty cards) are reached only through these traits so the core
//! services can be exercised against in-memory fakes.

use thiserror::Error;

use crate::models::{
    ConversationDetails, ConversationPage, LoyaltyCard, LoyaltyQuery, NewVoucher, Reservation,
    ReservationBatch, ReservationQuery, Voucher, VoucherQuery,
};
use shared::pagination::PageWalk;

/// Page size used when walking the full reservation listing.
pub const RESERVATION_PAGE_SIZE: u32 = 100;

/// Error type for upstream calls.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// The upstream service answered with an error.
    #[error("Upstream API error: {message}")]
    Upstream {
        message: String,
        code: Option<i64>,
        request_id: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl SourceError {
    pub fn upstream(message: impl Into<String>) -> Self {
        SourceError::Upstream {
            message: message.into(),
            code: None,
            request_id: None,
        }
    }

    /// Best-effort human-readable message for error responses.
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Upstream { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait ReservationSource: Send + Sync {
    async fn get_reservations(
        &self,
        query: &ReservationQuery,
    ) -> Result<ReservationBatch, SourceError>;
}

#[async_trait::async_trait]
pub trait ConversationSource: Send + Sync {
    /// List conversations; `page` is 1-based.
    async fn get_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ConversationPage, SourceError>;

    async fn get_conversation_details(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationDetails, SourceError>;
}

#[async_trait::async_trait]
pub trait VoucherSource: Send + Sync {
    async fn get_vouchers(&self, query: &VoucherQuery) -> Result<Vec<Voucher>, SourceError>;

    /// Create a voucher and return its id.
    async fn create_voucher(&self, voucher: &NewVoucher) -> Result<i64, SourceError>;

    async fn delete_voucher(
        &self,
        thirdparty_account_id: i64,
        voucher_id: i64,
    ) -> Result<(), SourceError>;
}

#[async_trait::async_trait]
pub trait LoyaltySource: Send + Sync {
    async fn get_loyalty_cards(&self, query: &LoyaltyQuery)
        -> Result<Vec<LoyaltyCard>, SourceError>;
}

/// Walks the reservation listing page by page and returns every reservation
/// matching `filter`.
///
/// Any failed page fails the whole call: callers use this at the top of a
/// request, where an incomplete calendar is worse than an error.
pub async fn fetch_all_reservations(
    source: &dyn ReservationSource,
    filter: &ReservationQuery,
) -> Result<Vec<Reservation>, SourceError> {
    let mut walk = PageWalk::new(RESERVATION_PAGE_SIZE);
    let mut reservations = Vec::new();

    while let Some(page) = walk.next_page() {
        let query = ReservationQuery {
            offset: u64::from(page - 1) * u64::from(walk.page_size()),
            limit: walk.page_size(),
            ..filter.clone()
        };

        let batch = source.get_reservations(&query).await?;
        walk.record(batch.page_len(), batch.total);
        reservations.extend(batch.reservations);
    }

    tracing::debug!(
        count = reservations.len(),
        pages = walk.pages_fetched(),
        "Fetched reservations"
    );

    Ok(reservations)
}
