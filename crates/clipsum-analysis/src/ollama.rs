//! Ollama client for locally hosted vision and reasoning models.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::backend::ComputeBackend;
use crate::error::{ModelError, ModelResult};
use crate::model::{FrameImage, GenerationRequest, ReasoningModel, VisionModel};

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default vision model (moondream2).
pub const DEFAULT_VISION_MODEL: &str = "moondream";

/// Default reasoning model (Phi-3 mini, 4k context).
pub const DEFAULT_REASONING_MODEL: &str = "phi3:mini";

/// Ollama `/api/generate` client bound to one model.
///
/// A local server runs one model instance on one device, so overlapping
/// calls are reported as unsafe unless configured otherwise.
#[derive(Clone)]
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model: String,
    backend: ComputeBackend,
    concurrent: bool,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_gpu: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaModel {
    /// Create a client for `model`. Each HTTP call is bounded by `timeout`.
    pub fn new(
        model: impl Into<String>,
        backend: ComputeBackend,
        timeout: Duration,
    ) -> ModelResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: model.into(),
            backend,
            concurrent: false,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Declare that the server can take overlapping calls for this model.
    pub fn with_concurrent_calls(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    fn options(&self, greedy: bool, num_predict: Option<u32>) -> OllamaOptions {
        OllamaOptions {
            temperature: greedy.then_some(0.0),
            top_k: greedy.then_some(1),
            seed: greedy.then_some(0),
            num_predict,
            num_gpu: self.backend.ollama_num_gpu(),
        }
    }

    async fn call_generate(&self, body: &OllamaGenerateRequest<'_>) -> ModelResult<String> {
        debug!(model = %self.model, backend = %self.backend, "Sending request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(body)
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

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        if parsed.response.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(parsed.response)
    }
}

#[async_trait]
impl VisionModel for OllamaModel {
    async fn describe(&self, image: &FrameImage, prompt: &str) -> ModelResult<String> {
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            images: vec![image.to_base64()],
            stream: false,
            options: self.options(true, None),
        };
        self.call_generate(&body).await
    }

    fn supports_concurrent_calls(&self) -> bool {
        self.concurrent
    }
}

#[async_trait]
impl ReasoningModel for OllamaModel {
    async fn generate(&self, request: &GenerationRequest) -> ModelResult<String> {
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            images: Vec::new(),
            stream: false,
            options: self.options(request.greedy, Some(request.max_new_tokens)),
        };
        self.call_generate(&body).await
    }

    fn supports_concurrent_calls(&self) -> bool {
        self.concurrent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model(server: &MockServer, name: &str, backend: ComputeBackend) -> OllamaModel {
        OllamaModel::new(name, backend, Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_describe_is_deterministic_and_sends_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "moondream",
                "images": ["YWJj"],
                "stream": false,
                "options": {"temperature": 0.0, "top_k": 1, "seed": 0, "num_gpu": 0}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": " A red car. "})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let image = FrameImage {
            bytes: b"abc".to_vec(),
            mime_type: "image/jpeg",
        };
        let vision = model(&server, "moondream", ComputeBackend::Cpu);
        assert_eq!(vision.describe(&image, "Describe").await.unwrap(), " A red car. ");
        assert!(!VisionModel::supports_concurrent_calls(&vision));
    }

    #[tokio::test]
    async fn test_generate_passes_token_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "phi3:mini",
                "options": {"num_predict": 200}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": "Story<|end|>"})),
            )
            .mount(&server)
            .await;

        let request = GenerationRequest {
            prompt: "Frame 1: a dog".to_string(),
            max_new_tokens: 200,
            greedy: true,
        };
        let reasoning = model(&server, "phi3:mini", ComputeBackend::Cuda);
        assert_eq!(reasoning.generate(&request).await.unwrap(), "Story<|end|>");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let request = GenerationRequest {
            prompt: "p".to_string(),
            max_new_tokens: 1,
            greedy: true,
        };
        let err = model(&server, "missing", ComputeBackend::Cpu)
            .generate(&request)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Status { status: 404, .. }));
    }

    #[test]
    fn test_options_omit_num_gpu_on_accelerators() {
        let m = OllamaModel::new("x", ComputeBackend::Metal, Duration::from_secs(1)).unwrap();
        let value = serde_json::to_value(m.options(true, Some(5))).unwrap();
        assert!(value.get("num_gpu").is_none());
        assert_eq!(value["num_predict"], 5);
    }
}
