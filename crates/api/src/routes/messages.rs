//! Message export for LLM training data.

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use domain::services::export_messages;

use crate::app::AppState;
use crate::middleware::metrics::record_export;

pub const EXPORT_FILENAME: &str = "hostex-messages-llm-training.txt";

/// Set to `true` when some pages or conversations could not be fetched.
pub const PARTIAL_EXPORT_HEADER: &str = "x-export-partial";

/// GET /messages/export/llm-training.txt
///
/// Page and conversation failures never fail the request; they are reported
/// in the transcript header and through [`PARTIAL_EXPORT_HEADER`].
pub async fn export_llm_training(State(state): State<AppState>) -> Response {
    let options = state.config.export_options();
    let outcome = export_messages(state.conversations.as_ref(), &options, Utc::now()).await;
    record_export(&outcome);
    let partial = outcome.is_partial();

    let mut response = (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        outcome.text,
    )
        .into_response();

    if partial {
        response.headers_mut().insert(
            HeaderName::from_static(PARTIAL_EXPORT_HEADER),
            HeaderValue::from_static("true"),
        );
    }

    response
}
