//! Imagen still-image generation client.
//!
//! Uses the Generative Language `:predict` endpoint:
//! https://ai.google.dev/gemini-api/docs/imagen

use base64::Engine as _;
use tracing::debug;

use crate::provider::ImageGenerator;
use crate::{GenAiError, classify_status};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct ImagenClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ImagenClient {
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
impl ImageGenerator for ImagenClient {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<Vec<u8>>, GenAiError> {
        let url = format!(
            "{}/models/{}:predict?key={}",
            self.base_url, self.model, self.api_key
        );
        debug!(model = %self.model, count, "Imagen request");

        let body = serde_json::json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": count }
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

        parse_predict_response(&data)
    }
}

fn parse_predict_response(data: &serde_json::Value) -> Result<Vec<Vec<u8>>, GenAiError> {
    let predictions = data["predictions"]
        .as_array()
        .ok_or_else(|| GenAiError::Provider("response has no predictions".into()))?;

    let mut images = Vec::with_capacity(predictions.len());
    for p in predictions {
        let encoded = p["bytesBase64Encoded"]
            .as_str()
            .ok_or_else(|| GenAiError::Provider("prediction has no image bytes".into()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| GenAiError::Decode(format!("image base64: {e}")))?;
        images.push(bytes);
    }

    if images.is_empty() {
        return Err(GenAiError::Provider("no images generated".into()));
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decodes_each_prediction() {
        let data = serde_json::json!({
            "predictions": [
                { "bytesBase64Encoded": "b25l", "mimeType": "image/png" },
                { "bytesBase64Encoded": "dHdv", "mimeType": "image/png" }
            ]
        });
        let images = parse_predict_response(&data).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0], b"one");
        assert_eq!(images[1], b"two");
    }

    #[test]
    fn parse_rejects_empty_predictions() {
        let data = serde_json::json!({ "predictions": [] });
        assert!(parse_predict_response(&data).is_err());
    }
}
