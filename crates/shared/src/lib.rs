//! Shared utilities and common types for the Booking Bridge backend.
//!
//! This crate provides small helpers used across the other crates:
//! - Display rounding and currency symbols for monetary amounts
//! - Page-walk bookkeeping for offset-paginated upstream APIs
//! - Fixed-width text helpers (greedy word wrap, banners)

pub mod money;
pub mod pagination;
pub mod text;
