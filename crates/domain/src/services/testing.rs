//! Fixtures shared by the service tests.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Conversation, LoyaltyCard, Message, MessageSender, MessageType, Money, Reservation,
    ReservationRates, ReservationStatus, Voucher,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Accepted 4-night stay for two adults, 800 EUR with 50 EUR commission.
pub fn reservation(code: &str) -> Reservation {
    Reservation {
        reservation_code: code.to_string(),
        property_id: 101,
        channel_type: Some("airbnb".to_string()),
        check_in_date: date(2024, 12, 1),
        check_out_date: date(2024, 12, 5),
        guest_name: "John Doe".to_string(),
        guest_email: Some("john@example.com".to_string()),
        guest_phone: Some("+49 170 0000000".to_string()),
        number_of_adults: 2,
        number_of_children: 0,
        number_of_infants: 0,
        number_of_pets: 0,
        status: ReservationStatus::Accepted,
        rates: Some(ReservationRates {
            total_rate: Money::new(800.0, "EUR"),
            total_commission: Some(Money::new(50.0, "EUR")),
        }),
        remarks: None,
        channel_remarks: None,
        booked_at: Some("2024-10-01T09:15:00+00:00".to_string()),
    }
}

pub fn conversation(id: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        reservation_code: Some(format!("RES-{}", id)),
        guest_name: format!("Guest {}", id),
        property_id: Some(101),
        channel: Some("airbnb".to_string()),
        last_message_at: Some(ts("2024-06-02T10:00:00Z")),
        unread_count: 0,
    }
}

pub fn message(conversation_id: &str, id: &str, sender: MessageSender, at: &str, text: &str) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        content: text.to_string(),
        sender,
        sent_at: ts(at),
        message_type: MessageType::Text,
        image_url: None,
    }
}

pub fn voucher(id: i64, code: &str) -> Voucher {
    Voucher {
        id,
        code: code.to_string(),
        discount: 10.0,
        discount_type: Default::default(),
        valid_from: None,
        valid_until: None,
        minimum_nights: 1,
        redemption_count: 1,
    }
}

pub fn loyalty_card(id: i64, code: Option<&str>, points: Option<f64>) -> LoyaltyCard {
    LoyaltyCard {
        id,
        code: code.map(str::to_string),
        points,
        expiration_date: None,
        partner_id: None,
    }
}
