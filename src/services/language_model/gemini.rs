//! Google Gemini `generateContent` client
//!
//! `POST <api_url>/models/<model>:generateContent` with the key in the
//! `x-goog-api-key` header. The reply text lives at
//! `candidates[0].content.parts[0].text`.
use crate::{
    error::{AppError, AppResult},
    services::language_model::LanguageModel,
};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

const TEMPERATURE: f64 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1024;

#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Builds a client, refusing a missing or blank key
    pub fn new(
        http_client: HttpClient,
        api_url: String,
        api_key: Option<String>,
        model: String,
    ) -> AppResult<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::LanguageModel("GEMINI_API_KEY is not configured".to_string()))?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }

    fn request_body(system: &str, prompt: &str) -> Value {
        json!({
            "systemInstruction": {
                "parts": [{ "text": system }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        })
    }

    fn extract_text(response: &Value) -> AppResult<String> {
        response["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::MalformedPayload(
                    "Failed to extract generated text from Gemini response".to_string(),
                )
            })
    }
}

#[async_trait::async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, system: &str, prompt: &str) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(system, prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, body = %body, "Gemini error response");
            return Err(AppError::LanguageModel(format!(
                "Gemini request failed with status {}",
                status
            )));
        }

        let body: Value = response.json().await?;
        let text = Self::extract_text(&body)?;

        tracing::debug!(
            model = %self.model,
            finish_reason = body["candidates"][0]["finishReason"].as_str().unwrap_or("unknown"),
            chars = text.len(),
            "Gemini generation completed"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
