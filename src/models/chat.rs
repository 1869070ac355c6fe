use serde::{Deserialize, Serialize};

use crate::models::user::UsageSnapshot;

/// Body of a chat request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Combined text+audio chat reply.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// Reference to the synthesized audio, absent when synthesis degraded
    pub audio: Option<String>,
    pub usage: UsageSnapshot,
}
