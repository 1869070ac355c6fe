use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 8000)
    pub port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Generation service base URL
    pub generation_base_url: String,
    /// Generation service API key (required, never a source literal)
    pub generation_api_key: String,
    /// Generation model name (default: gemini-2.0-flash)
    pub generation_model: String,
    /// Speech service base URL
    pub tts_base_url: String,
    /// Speech language passed to the synthesizer
    pub tts_language: String,
    /// Speaker voice passed to the synthesizer
    pub tts_speaker: String,
    /// Log level (default: info)
    pub log_level: String,
    /// CORS allowed origins (comma-separated, default: *)
    pub cors_origins: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/obala_users.db".to_string()),
            generation_base_url: env::var("GENERATION_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            generation_api_key: env::var("GENERATION_API_KEY")
                .map_err(|_| ConfigError::MissingEnvVar("GENERATION_API_KEY"))?,
            generation_model: env::var("GENERATION_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            tts_base_url: env::var("TTS_BASE_URL")
                .unwrap_or_else(|_| "https://ghana-nlp-southern-ghana-tts-public.hf.space".to_string()),
            tts_language: env::var("TTS_LANGUAGE").unwrap_or_else(|_| "Asante Twi".to_string()),
            tts_speaker: env::var("TTS_SPEAKER").unwrap_or_else(|_| "Male (Low)".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            cors_origins: env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid port number")]
    InvalidPort,
}
