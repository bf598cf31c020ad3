use axum::{middleware, routing::get, Router};
use domain::models::PropertyCatalog;
use domain::services::{ConversationSource, ReservationSource};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{bookings, calendar, health, messages, not_found, panic_response};

/// Upstream collaborators the HTTP surface reads from.
#[derive(Clone)]
pub struct Sources {
    pub reservations: Arc<dyn ReservationSource>,
    pub conversations: Arc<dyn ConversationSource>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub properties: Arc<PropertyCatalog>,
    pub reservations: Arc<dyn ReservationSource>,
    pub conversations: Arc<dyn ConversationSource>,
}

pub fn create_app(config: Config, sources: Sources) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        properties: Arc::new(config.property_catalog()),
        config: config.clone(),
        reservations: sources.reservations,
        conversations: sources.conversations,
    };

    let cors = if config.server.cors_origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any)
    } else {
        let origins: Vec<_> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
    };

    let request_timeout = TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_secs,
    ));

    let booking_routes = Router::new()
        .route("/bookings/next", get(bookings::next_bookings))
        .route(
            "/bookings/calendar/full-day.ics",
            get(calendar::full_day_ics),
        )
        .route(
            "/bookings/calendar/checkinout.ics",
            get(calendar::checkinout_ics),
        )
        .route(
            "/bookings/calendar/full-day.json",
            get(calendar::full_day_json),
        )
        .route(
            "/bookings/calendar/checkinout.json",
            get(calendar::checkinout_json),
        )
        .layer(request_timeout.clone());

    // Bounded by `export.max_duration_secs` instead of the request timeout
    // so a slow export still returns a partial transcript.
    let message_routes = Router::new().route(
        "/messages/export/llm-training.txt",
        get(messages::export_llm_training),
    );

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics_handler))
        .layer(request_timeout);

    Router::new()
        .merge(public_routes)
        .merge(booking_routes)
        .merge(message_routes)
        .fallback(not_found)
        // Global middleware (order matters: bottom layers run first)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
