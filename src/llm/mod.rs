mod gemini;

pub use gemini::{GeminiClient, GenerationError, FALLBACK_REPLY};
