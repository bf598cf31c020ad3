//! Calendar event model derived from reservations.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Start or end of a calendar event.
///
/// All-day events carry bare dates; timed events carry a floating local
/// timestamp (the property's wall-clock time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// A transient calendar entry built from one reservation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub is_all_day: bool,
    pub reservation_code: String,
}

impl CalendarEvent {
    /// Full-stay event spanning check-in to check-out.
    pub fn full_day(
        reservation_code: &str,
        title: String,
        description: String,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            uid: format!("booking-{}", reservation_code),
            title,
            description,
            start: EventTime::Date(start),
            end: EventTime::Date(end),
            is_all_day: true,
            reservation_code: reservation_code.to_string(),
        }
    }

    /// Zero-duration marker at a single instant; `uid_prefix` is `checkin` or
    /// `checkout`.
    pub fn marker(
        uid_prefix: &str,
        reservation_code: &str,
        title: String,
        description: String,
        at: NaiveDateTime,
    ) -> Self {
        Self {
            uid: format!("{}-{}", uid_prefix, reservation_code),
            title,
            description,
            start: EventTime::DateTime(at),
            end: EventTime::DateTime(at),
            is_all_day: false,
            reservation_code: reservation_code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_day_uid() {
        let event = CalendarEvent::full_day(
            "ABC",
            "t".into(),
            "d".into(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 5).unwrap(),
        );
        assert_eq!(event.uid, "booking-ABC");
        assert!(event.is_all_day);
    }

    #[test]
    fn test_marker_is_zero_duration() {
        let at = NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap();
        let event = CalendarEvent::marker("checkin", "ABC", "t".into(), "d".into(), at);
        assert_eq!(event.uid, "checkin-ABC");
        assert_eq!(event.start, event.end);
        assert!(!event.is_all_day);
    }

    #[test]
    fn test_json_shape() {
        let event = CalendarEvent::full_day(
            "ABC",
            "t".into(),
            "d".into(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 5).unwrap(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["isAllDay"], true);
        assert_eq!(json["start"], "2024-12-01");
        assert_eq!(json["reservationCode"], "ABC");
    }
}
