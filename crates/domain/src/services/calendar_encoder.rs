//! iCalendar (ICS) serialization of calendar events.

use icalendar::{Calendar, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike};
use thiserror::Error;

use crate::models::{CalendarEvent, EventTime};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Event for reservation {0} has no uid")]
    MissingUid(String),

    #[error("Event {uid} is malformed: {reason}")]
    MalformedEvent { uid: String, reason: String },
}

fn malformed(event: &CalendarEvent, reason: &str) -> CalendarError {
    CalendarError::MalformedEvent {
        uid: event.uid.clone(),
        reason: reason.to_string(),
    }
}

/// Checks the shape invariants of an event before it is encoded.
fn validate(event: &CalendarEvent) -> Result<(), CalendarError> {
    if event.uid.trim().is_empty() {
        return Err(CalendarError::MissingUid(event.reservation_code.clone()));
    }

    match (event.is_all_day, event.start, event.end) {
        (true, EventTime::Date(start), EventTime::Date(end)) => {
            if end <= start {
                return Err(malformed(event, "all-day event must end after it starts"));
            }
        }
        (false, EventTime::DateTime(start), EventTime::DateTime(end)) => {
            if start != end {
                return Err(malformed(event, "timed event must have zero duration"));
            }
        }
        (true, _, _) => return Err(malformed(event, "all-day event needs date bounds")),
        (false, _, _) => return Err(malformed(event, "timed event needs date-time bounds")),
    }

    Ok(())
}

fn to_ical(time: EventTime) -> DatePerhapsTime {
    match time {
        EventTime::Date(date) => DatePerhapsTime::Date(date),
        EventTime::DateTime(at) => DatePerhapsTime::DateTime(CalendarDateTime::Floating(at)),
    }
}

/// Encodes `events` into a single `VCALENDAR` document named `name`.
///
/// Any malformed event fails the whole document; nothing is emitted partially.
pub fn encode_calendar(name: &str, events: &[CalendarEvent]) -> Result<String, CalendarError> {
    let mut calendar = Calendar::new();
    calendar.name(name);

    for event in events {
        validate(event)?;

        let ical_event = Event::new()
            .uid(&event.uid)
            .summary(&event.title)
            .description(&event.description)
            .starts(to_ical(event.start))
            .ends(to_ical(event.end))
            .done();

        calendar.push(ical_event);
    }

    Ok(calendar.done().to_string())
}
