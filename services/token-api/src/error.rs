//! HTTP error mapping
//!
//! Translates core errors into the JSON error envelope:
//! `{ "error": { "type": ..., "message": ..., "fields": [...] } }`.
//! Authorization failures stay generic — a 403 body never says what
//! exists or what would have been allowed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use token_core::FieldError;

/// Errors a handler can surface to the client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("not authorized")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<token_core::Error> for ApiError {
    fn from(err: token_core::Error) -> Self {
        match err {
            token_core::Error::Validation(fields) => ApiError::Validation(fields),
            token_core::Error::TokenNotFound(_) => ApiError::NotFound("token not found".into()),
            err @ (token_core::Error::UnknownProject(_)
            | token_core::Error::UnknownPackage(_, _)) => ApiError::NotFound(err.to_string()),
            token_core::Error::Unauthorized => ApiError::Forbidden,
            token_core::Error::Storage(message) => ApiError::Storage(message),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::Forbidden => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::Storage(_) => "storage_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = serde_json::json!({
            "type": self.error_type(),
            "message": self.to_string(),
        });
        if let ApiError::Validation(fields) = &self {
            error["fields"] = serde_json::to_value(fields).unwrap_or_default();
        }

        (
            self.status(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            serde_json::json!({ "error": error }).to_string(),
        )
            .into_response()
    }
}
