//! Domain layer for the Booking Bridge backend.
//!
//! This crate contains:
//! - Domain models (Reservation, CalendarEvent, Conversation, Voucher, LoyaltyCard)
//! - Collaborator traits for the upstream data sources
//! - Business logic services (event generation, calendar encoding,
//!   message export, voucher reconciliation)

pub mod models;
pub mod services;
