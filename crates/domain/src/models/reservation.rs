//! Reservation domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Reservation Status Enum
// ============================================================================

/// Lifecycle status of a reservation as owned by the property-management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ReservationStatus {
    Pending,
    Accepted,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Accepted => "accepted",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReservationStatus::Cancelled)
    }
}

/// Maps upstream status strings onto the four canonical statuses.
///
/// Unknown values are treated as pending so that a new upstream status never
/// makes a whole reservation page undecodable.
impl From<String> for ReservationStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "accepted" | "confirmed" => ReservationStatus::Accepted,
            "cancelled" | "canceled" | "denied" | "timeout" => ReservationStatus::Cancelled,
            "completed" | "checked_out" => ReservationStatus::Completed,
            _ => ReservationStatus::Pending,
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Money & Rates
// ============================================================================

/// An amount in a given ISO 4217 currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub currency: String,
    pub amount: f64,
}

impl Money {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            amount,
        }
    }
}

/// Rate breakdown of a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRates {
    pub total_rate: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_commission: Option<Money>,
}

/// Guest counts of a reservation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuestCounts {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub pets: u32,
}

impl GuestCounts {
    /// One emoji per guest: 👤 adults, 👶 children, 🍼 infants, 🐾 pets,
    /// concatenated in that order without separators.
    pub fn emoji_string(&self) -> String {
        let mut out = String::new();
        for (count, emoji) in [
            (self.adults, "👤"),
            (self.children, "👶"),
            (self.infants, "🍼"),
            (self.pets, "🐾"),
        ] {
            for _ in 0..count {
                out.push_str(emoji);
            }
        }
        out
    }
}

// ============================================================================
// Core Model
// ============================================================================

/// A guest booking as returned by the property-management API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_code: String,
    pub property_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(default)]
    pub guest_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_phone: Option<String>,
    #[serde(default)]
    pub number_of_adults: u32,
    #[serde(default)]
    pub number_of_children: u32,
    #[serde(default)]
    pub number_of_infants: u32,
    #[serde(default)]
    pub number_of_pets: u32,
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<ReservationRates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<String>,
}

impl Reservation {
    pub fn guest_counts(&self) -> GuestCounts {
        GuestCounts {
            adults: self.number_of_adults,
            children: self.number_of_children,
            infants: self.number_of_infants,
            pets: self.number_of_pets,
        }
    }

    /// Whole nights between check-in and check-out.
    ///
    /// Both are calendar dates, so the day difference is already integral.
    pub fn nights(&self) -> i64 {
        (self.check_out_date - self.check_in_date).num_days()
    }
}

// ============================================================================
// Query DTOs
// ============================================================================

/// Filter for listing reservations from the upstream source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationQuery {
    pub start_check_in_date: Option<NaiveDate>,
    pub end_check_in_date: Option<NaiveDate>,
    pub property_id: Option<i64>,
    pub offset: u64,
    pub limit: u32,
}

/// One page of reservations plus upstream bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ReservationBatch {
    pub reservations: Vec<Reservation>,
    pub request_id: Option<String>,
    pub total: Option<u64>,
    /// Records on the page that could not be decoded and were dropped.
    pub skipped: usize,
}

impl ReservationBatch {
    /// Number of records the upstream page held, decodable or not.
    pub fn page_len(&self) -> usize {
        self.reservations.len() + self.skipped
    }
}
