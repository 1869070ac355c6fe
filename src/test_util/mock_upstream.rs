use serde_json::{json, Value};

/// Body the generation service returns for a successful reply.
pub fn generation_reply_json(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    })
}

/// Structurally valid generation body with nothing to extract.
pub fn generation_empty_json() -> Value {
    json!({ "candidates": [] })
}

pub fn generation_error_json(message: &str) -> Value {
    json!({ "error": { "message": message, "status": "INTERNAL" } })
}

/// Body the speech service returns with an audio reference.
pub fn tts_audio_json(path: &str) -> Value {
    json!({ "data": [path], "duration": 0.42 })
}

/// Body the speech service returns when it produced no usable audio.
pub fn tts_no_audio_json() -> Value {
    json!({ "data": [null] })
}
