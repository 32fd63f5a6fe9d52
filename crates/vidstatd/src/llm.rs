//! Ollama completion client for the generative parse path.
//!
//! One bounded, non-streaming call per parse attempt. The reply body is
//! untrusted free text; [`extract_json_object`] pulls the first
//! outermost `{...}` span out of it and tolerates trailing commas,
//! which small instruct models emit routinely.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info};
use vidstat_common::{GenerateRequest, GenerateResponse};

/// Default completion timeout; a slow backend past this point is treated
/// as failed and the heuristic path takes over.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Ollama client with model/endpoint fixed at construction.
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single completion round trip. Transport errors, timeouts, and
    /// non-success statuses all surface as errors here; the parser
    /// facade maps them into its fallback.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest::new(&self.model, prompt);

        info!("[>]  completion call [{}] ({} chars)", self.model, prompt.len());

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned error {status}: {error_text}");
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("failed to parse Ollama response body")?;

        debug!("[<]  completion reply ({} chars)", body.response.len());
        Ok(body.response)
    }
}

static RE_TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma regex"));

/// First outermost `{...}` span of a reply, cleaned of trailing commas.
/// Returns `None` when the text holds no brace pair at all.
pub fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let span = &text[start..=end];
    Some(RE_TRAILING_COMMA.replace_all(span, "$1").into_owned())
}
