//! Calendar feeds derived from reservations.
//!
//! The `.ics` routes serve subscribable iCalendar documents; the `.json`
//! variants return the same events as JSON for debugging.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Days, Utc};
use domain::models::{CalendarEvent, Reservation, ReservationQuery};
use domain::services::{
    encode_calendar, fetch_all_reservations, generate_checkinout_events, generate_full_day_events,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_calendar_events;

const ICS_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// Every reservation whose check-in is within the configured lookback window
/// or later.
async fn load_reservations(state: &AppState) -> Result<Vec<Reservation>, ApiError> {
    let today = Utc::now().date_naive();
    let since = today
        .checked_sub_days(Days::new(u64::from(state.config.calendar.lookback_days)))
        .unwrap_or(today);

    let filter = ReservationQuery {
        start_check_in_date: Some(since),
        ..Default::default()
    };
    Ok(fetch_all_reservations(state.reservations.as_ref(), &filter).await?)
}

async fn full_day_events(state: &AppState) -> Result<Vec<CalendarEvent>, ApiError> {
    let reservations = load_reservations(state).await?;
    let events = generate_full_day_events(&reservations);
    record_calendar_events("full-day", events.len());
    Ok(events)
}

async fn checkinout_events(state: &AppState) -> Result<Vec<CalendarEvent>, ApiError> {
    let reservations = load_reservations(state).await?;
    let events =
        generate_checkinout_events(&reservations, |id| state.properties.property_times(id));
    record_calendar_events("checkinout", events.len());
    Ok(events)
}

fn ics_response(
    state: &AppState,
    events: &[CalendarEvent],
    filename: &str,
) -> Result<Response, ApiError> {
    let body = encode_calendar(&state.config.calendar.name, events)?;
    Ok((
        [
            (header::CONTENT_TYPE, ICS_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /bookings/calendar/full-day.ics
pub async fn full_day_ics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let events = full_day_events(&state).await?;
    ics_response(&state, &events, "bookings-full-day.ics")
}

/// GET /bookings/calendar/checkinout.ics
pub async fn checkinout_ics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let events = checkinout_events(&state).await?;
    ics_response(&state, &events, "bookings-checkinout.ics")
}

/// GET /bookings/calendar/full-day.json
pub async fn full_day_json(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    Ok(Json(full_day_events(&state).await?))
}

/// GET /bookings/calendar/checkinout.json
pub async fn checkinout_json(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    Ok(Json(checkinout_events(&state).await?))
}
