use std::sync::Arc;

use axum::http::HeaderMap;
use axum::{extract::State, routing::post, Json, Router};

use crate::llm::FALLBACK_REPLY;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::routes::{ApiError, ValidationError};
use crate::AppState;

/// POST /obala_chat - quota-gated chat endpoint
async fn obala_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    // Identity first, eligibility second. Neither touches the counter.
    let user = state.authenticator.authenticate(&headers)?;
    let reservation = state.quota.authorize_and_reserve(&user)?;

    if request.prompt.is_empty() {
        return Err(ValidationError::EmptyPrompt.into());
    }

    // Upstream failures degrade the payload, never the request. The store
    // lock is not held across either call.
    let reply = match state.gemini.generate_reply(&request.prompt).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(user_id = %user.id, error = %err, "generation failed, using fallback reply");
            FALLBACK_REPLY.to_string()
        }
    };

    let audio = match state.tts.synthesize(&reply).await {
        Ok(audio) => audio,
        Err(err) => {
            tracing::warn!(user_id = %user.id, error = %err, "speech synthesis failed, returning text only");
            None
        }
    };

    // Charged only now that the upstream outcome is known. A reservation
    // that lost the race for the last unit comes back LimitReached here.
    let usage = reservation.commit()?;

    Ok(Json(ChatResponse {
        response: reply,
        audio,
        usage,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/obala_chat", post(obala_chat))
        .with_state(state)
}
