pub mod auth;
pub mod chat;
pub mod health;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;

use crate::auth::AuthError;
use crate::quota::QuotaError;
use crate::store::StoreError;
use crate::AppState;

/// Rejections raised while validating request bodies.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Prompt required")]
    EmptyPrompt,
    #[error("Missing email or password")]
    MissingField,
    #[error("Email already exists")]
    DuplicateEmail,
}

/// Login rejections. Deliberately a single message for unknown email and
/// wrong password alike.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid credentials")]
    Invalid,
}

/// Error reply rendered as `{"error": "<message>"}` with a specific status.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::Missing => StatusCode::UNAUTHORIZED,
            AuthError::Invalid => StatusCode::FORBIDDEN,
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        let status = match &err {
            QuotaError::Expired => StatusCode::FORBIDDEN,
            QuotaError::LimitReached => StatusCode::TOO_MANY_REQUESTS,
            QuotaError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ValidationError::DuplicateEmail.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Full route table for the gateway.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state.clone()))
        .merge(chat::router(state))
}
