//! Google Cloud Text-to-Speech client.
//!
//! https://cloud.google.com/text-to-speech/docs/reference/rest/v1/text/synthesize

use base64::Engine as _;
use tracing::debug;

use crate::provider::SpeechSynthesizer;
use crate::{GenAiError, classify_status};

const BASE_URL: &str = "https://texttospeech.googleapis.com/v1";

pub struct GoogleSpeechClient {
    base_url: String,
    api_key: String,
    language_code: String,
    client: reqwest::Client,
}

impl GoogleSpeechClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(BASE_URL.to_string(), api_key)
    }

    pub fn with_base_url(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            language_code: "en-US".to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GoogleSpeechClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, GenAiError> {
        let url = format!("{}/text:synthesize?key={}", self.base_url, self.api_key);
        debug!(voice = %voice, chars = text.len(), "TTS request");

        let body = serde_json::json!({
            "input": { "text": text },
            "voice": { "languageCode": self.language_code, "name": voice },
            "audioConfig": { "audioEncoding": "MP3" }
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

        parse_synthesize_response(&data)
    }
}

fn parse_synthesize_response(data: &serde_json::Value) -> Result<Vec<u8>, GenAiError> {
    let encoded = data["audioContent"]
        .as_str()
        .ok_or_else(|| GenAiError::Provider("response has no audioContent".into()))?;

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| GenAiError::Decode(format!("audioContent base64: {e}")))
}
