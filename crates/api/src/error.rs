use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::{CalendarError, SourceError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] SourceError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: "Internal server error".into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "Not Found".into(),
                    message,
                },
            ),
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Bad Request".into(),
                    message,
                },
            ),
            ApiError::Upstream(err) => {
                tracing::error!(error = %err, "Upstream request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::internal(err.user_message()),
                )
            }
            ApiError::Calendar(err) => {
                tracing::error!(error = %err, "Calendar encoding failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::internal(err.to_string()),
                )
            }
            ApiError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal(message))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors", messages.len())
        };

        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = ApiError::NotFound("Route GET /nope not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "Route GET /nope not found");
    }

    #[tokio::test]
    async fn test_upstream_error_uses_upstream_message() {
        let error: ApiError = SourceError::Upstream {
            message: "Invalid access token".into(),
            code: Some(401),
            request_id: Some("req-1".into()),
        }
        .into();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["message"], "Invalid access token");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_internal_error() {
        let response = ApiError::from(SourceError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Request timed out");
    }

    #[test]
    fn test_api_error_validation() {
        let response = ApiError::Validation("invalid input".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_calendar_error_is_internal() {
        let response = ApiError::from(CalendarError::MissingUid("R1".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::NotFound("x".into()).to_string(),
            "Not found: x"
        );
        assert_eq!(
            ApiError::Validation("x".into()).to_string(),
            "Validation error: x"
        );
        assert_eq!(
            ApiError::from(SourceError::Network("refused".into())).to_string(),
            "Network error: refused"
        );
    }
}
