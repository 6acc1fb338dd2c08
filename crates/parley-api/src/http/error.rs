//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Failure kinds reach the client as stable machine-readable codes plus a
//! human-readable message; internal detail (query text, stack traces) never
//! leaves the server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::{ChatError, InferenceError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat operation errors (the core surface).
    Chat(ChatError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

/// Stable code for each inference failure kind, used by clients to decide
/// how to render the failure.
fn inference_code(e: &InferenceError) -> &'static str {
    match e {
        InferenceError::Spawn(_) => "INFERENCE_SPAWN_FAILED",
        InferenceError::Process { .. } => "INFERENCE_PROCESS_FAILED",
        InferenceError::Protocol { .. } => "INFERENCE_PROTOCOL_ERROR",
        InferenceError::Model(_) => "MODEL_ERROR",
        InferenceError::Timeout { .. } => "INFERENCE_TIMEOUT",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Chat(ChatError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::NotFound) => (
                StatusCode::NOT_FOUND,
                "CHAT_NOT_FOUND",
                "Chat not found".to_string(),
            ),
            AppError::Chat(ChatError::Inference(e)) => {
                (StatusCode::BAD_GATEWAY, inference_code(e), e.to_string())
            }
            AppError::Chat(ChatError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Storage error".to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "timestamp": chrono::Utc::now().to_rfc3339(),
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let resp = AppError::Chat(ChatError::NotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let resp =
            AppError::Chat(ChatError::InvalidInput("empty".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_inference_failures_map_to_502_with_kind_code() {
        let cases = [
            (InferenceError::Spawn("x".into()), "INFERENCE_SPAWN_FAILED"),
            (
                InferenceError::Process { code: 1, stderr: "x".into() },
                "INFERENCE_PROCESS_FAILED",
            ),
            (
                InferenceError::Protocol { output: "x".into() },
                "INFERENCE_PROTOCOL_ERROR",
            ),
            (InferenceError::Model("x".into()), "MODEL_ERROR"),
            (InferenceError::Timeout { secs: 1 }, "INFERENCE_TIMEOUT"),
        ];
        for (err, expected_code) in cases {
            assert_eq!(inference_code(&err), expected_code);
            let resp = AppError::Chat(ChatError::Inference(err)).into_response();
            assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        }
    }

    #[test]
    fn test_storage_error_hides_detail() {
        let err = AppError::Chat(ChatError::Storage(
            parley_types::error::RepositoryError::Query("secret SQL detail".to_string()),
        ));
        // The response body must not echo the query text.
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
