use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::AiConfig;

const GEMINI_API: &str = "https://generativelanguage.googleapis.com/v1beta";

const TEMPERATURE: f32 = 0.5;
const MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: AiConfig,
}

impl GeminiClient {
    #[must_use]
    pub fn new(config: AiConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
                .build()
                .expect("Failed to build HTTP client"),
            config,
        }
    }

    /// Run a prompt against a stored object. The object is referenced by its
    /// `gs://` URI, so the model reads the content directly from the bucket.
    pub async fn generate_from_object(
        &self,
        prompt: &str,
        object_uri: &str,
        mime_type: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API, self.config.model, self.config.api_key
        );

        let payload = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "file_data": { "file_uri": object_uri, "mime_type": mime_type } }
                ]
            }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API error: {} - {}", status, body));
        }

        let response: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let text = response
            .candidates
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|parts| {
                let collected: String = parts.into_iter().filter_map(|p| p.text).collect();
                if collected.is_empty() {
                    None
                } else {
                    Some(collected)
                }
            })
            .ok_or_else(|| anyhow::anyhow!("Gemini API returned no candidate text"))?;

        Ok(text)
    }
}
