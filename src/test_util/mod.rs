pub mod mock_upstream;

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::auth::KeyAuthenticator;
use crate::config::Config;
use crate::llm::GeminiClient;
use crate::quota::QuotaEnforcer;
use crate::store::UserStore;
use crate::tts::TtsClient;
use crate::AppState;

/// Config pointing both upstreams at test servers, over an in-memory store.
pub fn test_config(generation_base_url: &str, tts_base_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8000,
        database_url: ":memory:".to_string(),
        generation_base_url: generation_base_url.to_string(),
        generation_api_key: "test-generation-key".to_string(),
        generation_model: "test-model".to_string(),
        tts_base_url: tts_base_url.to_string(),
        tts_language: "Asante Twi".to_string(),
        tts_speaker: "Male (Low)".to_string(),
        log_level: "debug".to_string(),
        cors_origins: "*".to_string(),
    }
}

/// App state wired to the given upstream bases.
pub fn create_test_state(generation_base_url: &str, tts_base_url: &str) -> Arc<AppState> {
    let config = test_config(generation_base_url, tts_base_url);
    let store = Arc::new(UserStore::new(&config.database_url).unwrap());
    let authenticator = KeyAuthenticator::new(store.clone());
    let quota = QuotaEnforcer::new(store.clone());
    let gemini = GeminiClient::new(
        &config.generation_base_url,
        &config.generation_api_key,
        &config.generation_model,
    );
    let tts = TtsClient::new(&config.tts_base_url, &config.tts_language, &config.tts_speaker);

    Arc::new(AppState {
        store,
        authenticator,
        quota,
        gemini,
        tts,
    })
}

/// Shrink a key's request ceiling so limit behavior is reachable quickly.
pub fn set_request_limit(state: &AppState, api_key: &str, limit: i64) {
    assert!(state.store.set_request_limit(api_key, limit).unwrap());
}

/// Push a key's expiry into the past.
pub fn expire_key(state: &AppState, api_key: &str) {
    let yesterday = Utc::now() - Duration::days(1);
    assert!(state.store.set_expires_at(api_key, yesterday).unwrap());
}
