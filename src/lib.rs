pub mod auth;
pub mod config;
pub mod llm;
pub mod logging;
pub mod models;
pub mod quota;
pub mod routes;
pub mod store;
pub mod test_util;
pub mod tts;

pub use auth::KeyAuthenticator;
pub use config::Config;
pub use llm::GeminiClient;
pub use models::chat::{ChatRequest, ChatResponse};
pub use models::user::{Plan, UsageSnapshot, User};
pub use quota::QuotaEnforcer;
pub use store::UserStore;
pub use tts::TtsClient;

use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub store: Arc<UserStore>,
    pub authenticator: KeyAuthenticator,
    pub quota: QuotaEnforcer,
    pub gemini: GeminiClient,
    pub tts: TtsClient,
}
