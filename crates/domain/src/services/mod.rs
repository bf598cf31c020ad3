//! Domain services for Booking Bridge.
//!
//! Services contain business logic that operates on domain models. Upstream
//! systems are reached only through the collaborator traits in [`sources`].

pub mod calendar_encoder;
pub mod event_generator;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod message_export;
pub mod sources;
pub mod voucher_reconciliation;

#[cfg(test)]
pub(crate) mod testing;

pub use calendar_encoder::{encode_calendar, CalendarError};
pub use event_generator::{
    generate_checkinout_events, generate_description, generate_full_day_events, generate_title,
    process_isolated, BatchOutcome, ProcessingError,
};
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemorySource;
pub use message_export::{export_messages, ExportOptions, ExportOutcome};
pub use sources::{
    fetch_all_reservations, ConversationSource, LoyaltySource, ReservationSource, SourceError,
    VoucherSource,
};
pub use voucher_reconciliation::{
    cleanup_vouchers, sync_loyalty_vouchers, CleanupOptions, CleanupReport, SyncReport,
};
