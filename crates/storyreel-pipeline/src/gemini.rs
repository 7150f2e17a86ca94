//! Gemini client for prompt text and scene images.
//!
//! Both capabilities go through the `generateContent` REST endpoint; only the
//! model and the requested response modalities differ.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::generation::{GeneratedImage, ImageGenerator, TextGenerator};

/// Header carrying the API key. Transport errors echo the URL, so the key stays out of it.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    client: Client,
    base_url: String,
    text_model: String,
    image_model: String,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GeminiResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter())
            .into_iter()
            .flatten()
    }

    /// All text parts joined and trimmed.
    fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// First inline part carrying an image.
    fn image(&self) -> Option<&InlineData> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| d.mime_type.starts_with("image/") && !d.data.is_empty())
    }
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
        timeout: Duration,
    ) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            text_model: text_model.into(),
            image_model: image_model.into(),
        })
    }

    /// Create a client from pipeline configuration. Fails without an API key.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        Self::new(
            config.require_api_key()?,
            &config.gemini_base_url,
            &config.text_model,
            &config.image_model,
            config.gemini_timeout,
        )
    }

    /// Call Gemini API.
    async fn call_gemini_api(
        &self,
        model: &str,
        prompt: &str,
        generation_config: Option<GenerationConfig>,
    ) -> PipelineResult<GeminiResponse> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        debug!("Calling Gemini model {}", model);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                PipelineError::generation_failed(format!("Gemini API request failed: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::generation_failed(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            PipelineError::generation_failed(format!("Failed to parse Gemini response: {}", e.without_url()))
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> PipelineResult<String> {
        let response = self.call_gemini_api(&self.text_model, prompt, None).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(PipelineError::generation_failed("No text in Gemini response"));
        }
        Ok(text)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> PipelineResult<GeneratedImage> {
        let config = GenerationConfig {
            response_modalities: vec!["Text".to_string(), "Image".to_string()],
        };
        let response = self
            .call_gemini_api(&self.image_model, prompt, Some(config))
            .await?;

        let image = response
            .image()
            .ok_or_else(|| PipelineError::generation_failed("No image data in Gemini response"))?;

        Ok(GeneratedImage {
            mime_type: image.mime_type.clone(),
            data_base64: image.data.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            "test-key",
            server.uri(),
            "text-model",
            "image-model",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_text_parts_are_concatenated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-model:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [
                    {"text": "  A lighthouse "},
                    {"text": "at dusk.  "}
                ]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).generate("describe").await.unwrap();
        assert_eq!(text, "A lighthouse at dusk.");
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client(&server).generate("describe").await.unwrap_err();
        assert!(matches!(err, PipelineError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_image_request_asks_for_image_modality() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/image-model:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": {"responseModalities": ["Text", "Image"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [
                    {"text": "Here is your image"},
                    {"inlineData": {"mimeType": "text/plain", "data": "aGk="}},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                ]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = client(&server).generate_image("a fox").await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_base64, "iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_missing_image_is_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "I cannot draw that"}]}}]
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate_image("a fox").await.unwrap_err();
        assert!(err.to_string().contains("No image data"));
    }

    #[tokio::test]
    async fn test_http_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exhausted"))
            .mount(&server)
            .await;

        let err = client(&server).generate("describe").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_api_key() {
        // Nothing listens on the discard port.
        let client = GeminiClient::new(
            "SECRET-KEY",
            "http://127.0.0.1:9",
            "text-model",
            "image-model",
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client.generate_image("a fox").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Gemini API request failed"));
        assert!(!msg.contains("SECRET-KEY"));
        assert!(!msg.contains("key="));
    }
}
