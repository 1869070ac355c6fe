use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, verify_password};
use crate::models::user::Plan;
use crate::routes::{ApiError, CredentialError, ValidationError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Reply for both signup and login: the message plus the caller's API key.
#[derive(Debug, Serialize)]
pub struct KeyResponse {
    pub message: &'static str,
    pub api_key: String,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

/// POST /signup - register a developer and issue an API key
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<KeyResponse>), ApiError> {
    let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
        return Err(ValidationError::MissingField.into());
    };

    let password_hash = hash_password(&password).map_err(|e| ApiError::internal(e.to_string()))?;

    let user = state.store.create_user(
        body.full_name.as_deref().unwrap_or(""),
        &email,
        &password_hash,
        Plan::Free,
    )?;

    tracing::info!(user_id = %user.id, "developer signed up");

    Ok((
        StatusCode::CREATED,
        Json(KeyResponse {
            message: "Signup successful",
            api_key: user.api_key,
        }),
    ))
}

/// POST /login - return the caller's API key
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
        return Err(CredentialError::Invalid.into());
    };

    let Some(user) = state.store.find_by_email(&email)? else {
        tracing::warn!("login with unknown email");
        return Err(CredentialError::Invalid.into());
    };

    if !verify_password(&password, &user.password_hash) {
        tracing::warn!(user_id = %user.id, "login with wrong password");
        return Err(CredentialError::Invalid.into());
    }

    tracing::info!(user_id = %user.id, "developer logged in");

    Ok(Json(KeyResponse {
        message: "Login successful",
        api_key: user.api_key,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .with_state(state)
}
