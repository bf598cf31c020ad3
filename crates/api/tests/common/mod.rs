//! Common test utilities for integration tests.
//!
//! The app is wired to an [`InMemorySource`] so routes run end to end
//! without reaching the upstream APIs.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use booking_bridge_api::app::{create_app, Sources};
use booking_bridge_api::config::{
    CalendarConfig, Config, ExportConfig, HostexConfig, JobsConfig, LoggingConfig, OdooConfig,
    ServerConfig,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use domain::models::{
    Conversation, Message, MessageSender, MessageType, Money, PropertySettings,
    PropertyTimeConfig, Reservation, ReservationRates, ReservationStatus, TimeOfDay,
};
use domain::services::InMemorySource;
use fake::faker::name::en::Name;
use fake::Fake;

/// Test configuration with two properties; 101 has custom check-in/out times.
pub fn test_config() -> Config {
    let mut custom_times = PropertySettings::new(101);
    custom_times.name = Some("Seaside Loft".to_string());
    custom_times.times = Some(PropertyTimeConfig {
        check_in: TimeOfDay::new(15, 30),
        check_out: TimeOfDay::new(11, 0),
    });

    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 30,
            cors_origins: vec![],
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        hostex: HostexConfig {
            base_url: "http://localhost:9".to_string(),
            access_token: "test-token".to_string(),
            timeout_ms: 1000,
        },
        odoo: OdooConfig::default(),
        export: ExportConfig::default(),
        jobs: JobsConfig::default(),
        calendar: CalendarConfig {
            name: "Test Bookings".to_string(),
            lookback_days: 30,
        },
        properties: vec![custom_times, PropertySettings::new(102)],
    }
}

/// Create a test application router backed by `source`.
pub fn create_test_app(config: Config, source: InMemorySource) -> Router {
    let source = Arc::new(source);
    create_app(
        config,
        Sources {
            reservations: source.clone(),
            conversations: source,
        },
    )
}

pub fn days_from_today(days: u64) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_add_days(Days::new(days))
        .unwrap()
}

/// Accepted stay for two adults checking in `days_ahead` days from now.
pub fn upcoming_reservation(code: &str, property_id: i64, days_ahead: u64) -> Reservation {
    Reservation {
        reservation_code: code.to_string(),
        property_id,
        channel_type: Some("airbnb".to_string()),
        check_in_date: days_from_today(days_ahead),
        check_out_date: days_from_today(days_ahead + 3),
        guest_name: Name().fake(),
        guest_email: None,
        guest_phone: None,
        number_of_adults: 2,
        number_of_children: 0,
        number_of_infants: 0,
        number_of_pets: 0,
        status: ReservationStatus::Accepted,
        rates: Some(ReservationRates {
            total_rate: Money::new(600.0, "EUR"),
            total_commission: Some(Money::new(60.0, "EUR")),
        }),
        remarks: None,
        channel_remarks: None,
        booked_at: None,
    }
}

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn conversation(id: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        reservation_code: Some(format!("RES-{}", id)),
        guest_name: format!("Guest {}", id),
        property_id: Some(101),
        channel: Some("airbnb".to_string()),
        last_message_at: Some(ts("2024-11-02T10:00:00Z")),
        unread_count: 0,
    }
}

pub fn text_message(conversation_id: &str, sender: MessageSender, content: &str) -> Message {
    Message {
        id: format!("{}-{}", conversation_id, content.len()),
        conversation_id: conversation_id.to_string(),
        content: content.to_string(),
        sender,
        sent_at: ts("2024-11-02T09:00:00Z"),
        message_type: MessageType::Text,
        image_url: None,
    }
}

/// Build a GET request without authentication.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Read the response body as text.
pub async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
