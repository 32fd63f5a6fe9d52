//! Ollama wire protocol types for the `/api/generate` endpoint.
//!
//! One request per parse attempt: `{model, prompt, stream:false,
//! options:{temperature:0}}`. The textual `response` body is untrusted
//! free text; nothing beyond JSON extraction is ever done with it.

use serde::{Deserialize, Serialize};

/// Request body for a single non-streaming completion.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

/// Sampling options. Temperature 0 keeps intent extraction deterministic.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        }
    }
}

/// The only field of the response body the parser consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}
