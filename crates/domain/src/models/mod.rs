//! Domain models for Booking Bridge.

pub mod calendar_event;
pub mod conversation;
pub mod loyalty;
pub mod property;
pub mod reservation;
pub mod voucher;

pub use calendar_event::{CalendarEvent, EventTime};
pub use conversation::{
    Conversation, ConversationDetails, ConversationPage, Message, MessageSender, MessageType,
};
pub use loyalty::{LoyaltyCard, LoyaltyQuery, PartnerRef};
pub use property::{
    LoyaltyVoucherConfig, PropertyCatalog, PropertySettings, PropertyTimeConfig, TimeOfDay,
};
pub use reservation::{
    GuestCounts, Money, Reservation, ReservationBatch, ReservationQuery, ReservationRates,
    ReservationStatus,
};
pub use voucher::{DiscountType, NewVoucher, Voucher, VoucherQuery};
