//! error.rs
//!
//! Error taxonomy shared by the store, the services and the HTTP layer.
//! Every variant maps to exactly one status code; the body always carries a
//! human-readable `message` that the frontend shows as-is.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Event with ID \"{0}\" not found")]
    NotFound(Uuid),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("File too large. Maximum size is {limit_mb}MB")]
    PayloadTooLarge { limit_mb: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UnsupportedMediaType(_)
            | AppError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            AppError::Io(e) => error!(error = ?e, "I/O failure"),
            other => warn!(reason = %other, "Request rejected"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.log();

        // Storage paths and OS error text stay in the logs.
        let message = match &self {
            AppError::Io(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Error").to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join(", "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::Validation(field_message(&e.body_text())),
            other => AppError::Validation(other.body_text()),
        }
    }
}

/// Reduces a body deserialization failure to what the client can act on:
/// drops the framework prefix and the parser position, and keeps the field
/// path only when the reason does not already name the field.
fn field_message(text: &str) -> String {
    let detail = text.split_once("target type: ").map_or(text, |(_, d)| d);
    let detail = detail.rfind(" at line ").map_or(detail, |i| &detail[..i]);
    match detail.split_once(": ") {
        Some((field, reason)) if reason.starts_with(field) => reason.to_string(),
        _ => detail.to_string(),
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::Validation("Validation failed (uuid is expected)".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Titled {
        #[validate(length(min = 3, message = "title must be longer than or equal to 3 characters"))]
        title: String,
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound(Uuid::new_v4()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::UnsupportedMediaType("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge { limit_mb: 5 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Io(std::io::Error::other("x")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_keep_field_messages() {
        let err: AppError = Titled { title: "ab".into() }.validate().unwrap_err().into();
        assert_eq!(
            err.to_string(),
            "title must be longer than or equal to 3 characters"
        );
    }

    #[test]
    fn body_errors_drop_parser_noise() {
        assert_eq!(
            field_message(
                "Failed to deserialize the JSON body into the target type: startTime: \
                 startTime must be a valid ISO 8601 date string at line 1 column 38"
            ),
            "startTime must be a valid ISO 8601 date string"
        );
        assert_eq!(
            field_message(
                "Failed to deserialize the JSON body into the target type: \
                 missing field `endTime` at line 1 column 40"
            ),
            "missing field `endTime`"
        );
        assert_eq!(
            field_message(
                "Failed to deserialize the JSON body into the target type: title: \
                 invalid type: integer `5`, expected a string at line 1 column 10"
            ),
            "title: invalid type: integer `5`, expected a string"
        );
    }

    #[tokio::test]
    async fn response_body_exposes_message() {
        let id = Uuid::new_v4();
        let response = AppError::NotFound(id).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], format!("Event with ID \"{id}\" not found"));
    }

    #[tokio::test]
    async fn io_details_are_not_exposed() {
        let err = AppError::Io(std::io::Error::other("/secret/path unreadable"));
        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }
}
