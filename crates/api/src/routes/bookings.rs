//! Upcoming reservations listing.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Utc;
use domain::models::{Reservation, ReservationQuery};
use serde::{Deserialize, Serialize};
use shared::pagination::offset_for;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NextBookingsQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "pageSize must be between 1 and 100"))]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Serialize)]
pub struct BookingList {
    pub reservations: Vec<Reservation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBookingsResponse {
    pub bookings: BookingList,
    pub page: u32,
    pub page_size: u32,
    pub request_id: Option<String>,
    pub total: Option<u64>,
}

/// Reservations checking in today or later, one page at a time.
///
/// GET /bookings/next?page=&pageSize=
pub async fn next_bookings(
    State(state): State<AppState>,
    query: Result<Query<NextBookingsQuery>, QueryRejection>,
) -> Result<Json<NextBookingsResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    query.validate()?;

    let offset = offset_for(query.page, query.page_size)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let batch = state
        .reservations
        .get_reservations(&ReservationQuery {
            start_check_in_date: Some(Utc::now().date_naive()),
            offset,
            limit: query.page_size,
            ..Default::default()
        })
        .await?;

    tracing::debug!(
        page = query.page,
        returned = batch.reservations.len(),
        "Fetched upcoming bookings"
    );

    Ok(Json(NextBookingsResponse {
        bookings: BookingList {
            reservations: batch.reservations,
        },
        page: query.page,
        page_size: query.page_size,
        request_id: batch.request_id,
        total: batch.total,
    }))
}
