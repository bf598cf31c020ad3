//! HTTP route handlers.

pub mod bookings;
pub mod calendar;
pub mod health;
pub mod messages;

use std::any::Any;

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ApiError, ErrorBody};
use crate::middleware::get_request_id;

/// Fallback for unmatched routes.
pub async fn not_found(req: Request) -> ApiError {
    let message = format!("Route {} {} not found", req.method(), req.uri().path());
    tracing::debug!(request_id = %get_request_id(req.extensions()), "{}", message);
    ApiError::NotFound(message)
}

/// Converts a handler panic into the JSON 500 body.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown error".to_string()
    };
    tracing::error!(panic = %message, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::internal(message)),
    )
        .into_response()
}
