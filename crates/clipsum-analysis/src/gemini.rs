//! Gemini API client for frame description and summarization.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::model::{FrameImage, GenerationRequest, ReasoningModel, VisionModel};

/// Public Gemini endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model for both roles.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Gemini API client. Stateless over HTTP, so concurrent calls are safe.
#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    candidate_count: u32,
}

impl GenerationConfig {
    fn new(greedy: bool, max_output_tokens: Option<u32>) -> Self {
        Self {
            temperature: greedy.then_some(0.0),
            top_k: greedy.then_some(1),
            max_output_tokens,
            candidate_count: 1,
        }
    }
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
struct ResponsePart {
    text: Option<String>,
}

impl GeminiModel {
    /// Create a client for `model`. Each HTTP call is bounded by `timeout`.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> ModelResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::Config("GEMINI_API_KEY not set".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call_gemini_api(&self, request: &GeminiRequest) -> ModelResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(model = %self.model, "Sending request to Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl VisionModel for GeminiModel {
    async fn describe(&self, image: &FrameImage, prompt: &str) -> ModelResult<String> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type.to_string(),
                            data: image.to_base64(),
                        }),
                    },
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                ],
            }],
            generation_config: GenerationConfig::new(true, None),
        };

        self.call_gemini_api(&request).await
    }

    fn supports_concurrent_calls(&self) -> bool {
        true
    }
}

#[async_trait]
impl ReasoningModel for GeminiModel {
    async fn generate(&self, request: &GenerationRequest) -> ModelResult<String> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                    inline_data: None,
                }],
            }],
            generation_config: GenerationConfig::new(request.greedy, Some(request.max_new_tokens)),
        };

        self.call_gemini_api(&request).await
    }

    fn supports_concurrent_calls(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiModel {
        GeminiModel::new("test-key", "gemini-test", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri())
    }

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        }))
    }

    #[tokio::test]
    async fn test_describe_sends_inline_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "image/jpeg", "data": "YWJj"}},
                    {"text": "Describe what is happening in this image."}
                ]}],
                "generationConfig": {"temperature": 0.0, "topK": 1}
            })))
            .respond_with(reply("A man is walking a dog."))
            .expect(1)
            .mount(&server)
            .await;

        let image = FrameImage {
            bytes: b"abc".to_vec(),
            mime_type: "image/jpeg",
        };
        let text = client(&server)
            .describe(&image, "Describe what is happening in this image.")
            .await
            .unwrap();
        assert_eq!(text, "A man is walking a dog.");
    }

    #[tokio::test]
    async fn test_generate_bounds_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "generationConfig": {"maxOutputTokens": 200, "topK": 1}
            })))
            .respond_with(reply("A short story."))
            .mount(&server)
            .await;

        let request = GenerationRequest {
            prompt: "Frame 1: a dog".to_string(),
            max_new_tokens: 200,
            greedy: true,
        };
        assert_eq!(client(&server).generate(&request).await.unwrap(), "A short story.");
    }

    #[tokio::test]
    async fn test_error_status_and_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(path("/models/gemini-test:generateContent"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(path("/models/gemini-test:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let request = GenerationRequest {
            prompt: "p".to_string(),
            max_new_tokens: 10,
            greedy: true,
        };
        let model = client(&server);
        assert!(matches!(
            model.generate(&request).await,
            Err(ModelError::Status { status: 429, .. })
        ));
        assert!(matches!(
            model.generate(&request).await,
            Err(ModelError::EmptyResponse)
        ));
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            GeminiModel::new("", "m", Duration::from_secs(1)),
            Err(ModelError::Config(_))
        ));
    }
}
