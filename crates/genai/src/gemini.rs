//! Gemini text generation client.
//!
//! Uses the Generative Language REST API:
//! https://ai.google.dev/api/generate-content

use tracing::debug;

use crate::provider::EndingGenerator;
use crate::{GenAiError, classify_status};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// How much of the screenplay is sent along as context. Scripts run to
/// hundreds of kilobytes; the opening excerpt is enough to anchor tone and
/// characters while keeping token usage down.
pub const SCRIPT_CONTEXT_CHARS: usize = 3000;

pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(BASE_URL.to_string(), api_key, model)
    }

    pub fn with_base_url(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url,
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl EndingGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_ending(
        &self,
        movie: &str,
        prompt: &str,
        script: &str,
    ) -> Result<String, GenAiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        debug!(model = %self.model, movie = %movie, "Gemini request");

        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": build_ending_prompt(movie, prompt, script) }]
            }]
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenAiError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GenAiError::Provider(format!("parse JSON: {e}")))?;

        parse_generate_response(&data)
    }
}

/// Build the generation prompt. The screenplay is truncated to
/// [`SCRIPT_CONTEXT_CHARS`] characters.
pub fn build_ending_prompt(movie: &str, prompt: &str, script: &str) -> String {
    let context: String = script.chars().take(SCRIPT_CONTEXT_CHARS).collect();

    format!(
        "Create an alternate ending for \"{movie}\" based on:\n\
         {prompt}\n\
         \n\
         Original context (partial):\n\
         {context}\n\
         \n\
         Format:\n\
         === Alternate Ending ===\n\
         *Visual*: [Scene description]\n\
         *Narration*: [Narration text]\n\
         *Dialogue*: [Character lines]\n\
         *Notes*: [Production details]"
    )
}

fn parse_generate_response(data: &serde_json::Value) -> Result<String, GenAiError> {
    let parts = data["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| GenAiError::Provider("response has no candidates".into()))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(GenAiError::Provider("response candidate has no text".into()));
    }

    Ok(text)
}
