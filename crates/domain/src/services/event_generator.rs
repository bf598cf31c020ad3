//! Reservation to calendar event transformation.
//!
//! Two display modes are supported: one all-day event spanning the stay, or a
//! pair of zero-duration markers at the property's check-in and check-out
//! times. Cancelled reservations never produce events, and a reservation that
//! cannot be rendered is logged and skipped without affecting the others.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tracing::warn;

use crate::models::{CalendarEvent, PropertyTimeConfig, Reservation, TimeOfDay};
use shared::money::format_rounded;

/// A single reservation could not be turned into calendar events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to process reservation {reservation_code}: {message}")]
pub struct ProcessingError {
    pub reservation_code: String,
    pub message: String,
}

impl ProcessingError {
    pub fn new(reservation: &Reservation, message: impl Into<String>) -> Self {
        Self {
            reservation_code: reservation.reservation_code.clone(),
            message: message.into(),
        }
    }
}

/// Successes and per-item failures of a batch transformation.
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub items: Vec<T>,
    pub failures: Vec<ProcessingError>,
}

/// Applies `f` to every input, isolating failures.
///
/// Each `Err` is logged and collected; it never stops the remaining inputs
/// from being processed. `f` returns a `Vec` so one input can expand into
/// several outputs that are kept or dropped together.
pub fn process_isolated<I, T, F>(inputs: &[I], mut f: F) -> BatchOutcome<T>
where
    F: FnMut(&I) -> Result<Vec<T>, ProcessingError>,
{
    inputs.iter().fold(
        BatchOutcome {
            items: Vec::new(),
            failures: Vec::new(),
        },
        |mut outcome, input| {
            match f(input) {
                Ok(produced) => outcome.items.extend(produced),
                Err(err) => {
                    warn!(
                        reservation_code = %err.reservation_code,
                        error = %err.message,
                        "Skipping reservation"
                    );
                    outcome.failures.push(err);
                }
            }
            outcome
        },
    )
}

/// Nights of the stay; fails when check-out is not after check-in.
fn stay_nights(reservation: &Reservation) -> Result<i64, ProcessingError> {
    let nights = reservation.nights();
    if nights <= 0 {
        return Err(ProcessingError::new(
            reservation,
            format!(
                "check-out date {} is not after check-in date {}",
                reservation.check_out_date, reservation.check_in_date
            ),
        ));
    }
    Ok(nights)
}

/// Total rate, commission and net rate, all in the rate's currency.
struct Financials {
    currency: String,
    total: f64,
    commission: f64,
    net: f64,
}

fn financials(reservation: &Reservation) -> Result<Financials, ProcessingError> {
    let rates = reservation
        .rates
        .as_ref()
        .ok_or_else(|| ProcessingError::new(reservation, "missing rates"))?;

    let total = &rates.total_rate;
    if !total.amount.is_finite() {
        return Err(ProcessingError::new(reservation, "total rate is not a number"));
    }

    let commission = match &rates.total_commission {
        Some(c) if !c.currency.eq_ignore_ascii_case(&total.currency) => {
            return Err(ProcessingError::new(
                reservation,
                format!(
                    "commission currency {} differs from rate currency {}",
                    c.currency, total.currency
                ),
            ));
        }
        Some(c) if !c.amount.is_finite() => {
            return Err(ProcessingError::new(reservation, "commission is not a number"));
        }
        Some(c) => c.amount,
        None => 0.0,
    };

    Ok(Financials {
        currency: total.currency.clone(),
        total: total.amount,
        commission,
        net: total.amount - commission,
    })
}

fn guest_name(reservation: &Reservation) -> &str {
    let name = reservation.guest_name.trim();
    if name.is_empty() {
        "Unknown guest"
    } else {
        name
    }
}

/// `"<guest> #<nights> <total><sym> (<net><sym>) <emoji>"`.
pub fn generate_title(reservation: &Reservation) -> Result<String, ProcessingError> {
    let nights = stay_nights(reservation)?;
    let money = financials(reservation)?;

    Ok(format!(
        "{} #{} {} ({}) {}",
        guest_name(reservation),
        nights,
        format_rounded(money.total, &money.currency),
        format_rounded(money.net, &money.currency),
        reservation.guest_counts().emoji_string()
    ))
}

/// Multi-line event description with booking, financial and booking-source
/// sections, followed by any remarks.
pub fn generate_description(reservation: &Reservation) -> Result<String, ProcessingError> {
    let nights = stay_nights(reservation)?;
    let money = financials(reservation)?;
    let counts = reservation.guest_counts();

    let or_na = |value: &Option<String>| -> String {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("N/A")
            .to_string()
    };

    let mut lines = vec![
        "BOOKING DETAILS".to_string(),
        format!("Guest: {}", guest_name(reservation)),
        format!("Email: {}", or_na(&reservation.guest_email)),
        format!("Phone: {}", or_na(&reservation.guest_phone)),
        format!(
            "Guests: {} adults, {} children, {} infants, {} pets",
            counts.adults, counts.children, counts.infants, counts.pets
        ),
        format!("Stay: {} night{}", nights, if nights == 1 { "" } else { "s" }),
        format!("Check-in: {}", reservation.check_in_date),
        format!("Check-out: {}", reservation.check_out_date),
        String::new(),
        "FINANCIAL DETAILS".to_string(),
        format!("Total rate: {}", format_rounded(money.total, &money.currency)),
        format!("Commission: {}", format_rounded(money.commission, &money.currency)),
        format!("Net rate: {}", format_rounded(money.net, &money.currency)),
        String::new(),
        "BOOKING INFORMATION".to_string(),
        format!("Channel: {}", or_na(&reservation.channel_type)),
        format!("Reservation code: {}", reservation.reservation_code),
        format!("Status: {}", reservation.status),
        format!("Booked at: {}", or_na(&reservation.booked_at)),
    ];

    for (heading, text) in [
        ("REMARKS", &reservation.remarks),
        ("CHANNEL REMARKS", &reservation.channel_remarks),
    ] {
        if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
            lines.push(String::new());
            lines.push(heading.to_string());
            lines.push(text.to_string());
        }
    }

    Ok(lines.join("\n"))
}

fn active(reservations: &[Reservation]) -> Vec<Reservation> {
    reservations
        .iter()
        .filter(|r| !r.status.is_cancelled())
        .cloned()
        .collect()
}

/// One all-day event per non-cancelled reservation.
pub fn generate_full_day_events(reservations: &[Reservation]) -> Vec<CalendarEvent> {
    let outcome = process_isolated(&active(reservations), |reservation| {
        let title = generate_title(reservation)?;
        let description = generate_description(reservation)?;
        Ok(vec![CalendarEvent::full_day(
            &reservation.reservation_code,
            title,
            description,
            reservation.check_in_date,
            reservation.check_out_date,
        )])
    });

    tracing::debug!(
        events = outcome.items.len(),
        skipped = outcome.failures.len(),
        "Generated full-day events"
    );
    outcome.items
}

fn at_time(
    reservation: &Reservation,
    date: NaiveDate,
    time: TimeOfDay,
    label: &str,
) -> Result<NaiveDateTime, ProcessingError> {
    NaiveTime::from_hms_opt(time.hour, time.minute, 0)
        .map(|t| date.and_time(t))
        .ok_or_else(|| {
            ProcessingError::new(
                reservation,
                format!(
                    "invalid {} time {:02}:{:02} for property {}",
                    label, time.hour, time.minute, reservation.property_id
                ),
            )
        })
}

/// A check-in and a check-out marker per non-cancelled reservation.
///
/// `times` resolves a property id to its configured check-in/out times. If
/// either marker cannot be built, neither is emitted.
pub fn generate_checkinout_events<F>(reservations: &[Reservation], times: F) -> Vec<CalendarEvent>
where
    F: Fn(i64) -> PropertyTimeConfig,
{
    let outcome = process_isolated(&active(reservations), |reservation| {
        let title = generate_title(reservation)?;
        let description = generate_description(reservation)?;
        let config = times(reservation.property_id);

        let check_in = at_time(
            reservation,
            reservation.check_in_date,
            config.check_in,
            "check-in",
        )?;
        let check_out = at_time(
            reservation,
            reservation.check_out_date,
            config.check_out,
            "check-out",
        )?;

        Ok(vec![
            CalendarEvent::marker(
                "checkin",
                &reservation.reservation_code,
                format!("Check-in: {}", title),
                description.clone(),
                check_in,
            ),
            CalendarEvent::marker(
                "checkout",
                &reservation.reservation_code,
                format!("Check-out: {}", title),
                description,
                check_out,
            ),
        ])
    });

    tracing::debug!(
        events = outcome.items.len(),
        skipped = outcome.failures.len(),
        "Generated check-in/out events"
    );
    outcome.items
}
