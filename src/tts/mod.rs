use reqwest::Client;
use serde_json::{json, Value};

/// Client for the gradio-hosted speech synthesis service.
pub struct TtsClient {
    http_client: Client,
    base_url: String,
    language: String,
    speaker: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Speech service error: {0}")]
    Upstream(String),
}

impl TtsClient {
    pub fn new(base_url: &str, language: &str, speaker: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            speaker: speaker.to_string(),
        }
    }

    /// One attempt at synthesizing speech for the text. No retries.
    ///
    /// `Ok(None)` means the service answered without a usable audio
    /// reference; only a string in the first data slot counts as one.
    pub async fn synthesize(&self, text: &str) -> Result<Option<String>, TtsError> {
        let url = format!("{}/run/predict", self.base_url);
        let payload = json!({ "data": [text, self.language, self.speaker] });

        tracing::debug!(language = %self.language, speaker = %self.speaker, "sending request to speech service");

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TtsError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Upstream(format!("{}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))?;

        let audio = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|data| data.first())
            .and_then(Value::as_str)
            .map(String::from);

        Ok(audio)
    }
}
