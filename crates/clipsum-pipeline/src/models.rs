//! Model handle construction.
//!
//! Called once at startup. The returned handles are shared by every request;
//! handles that cannot take overlapping calls come back already serialized.

use std::sync::Arc;
use tracing::info;

use clipsum_analysis::{
    serialize_reasoning, serialize_vision, ComputeBackend, GeminiModel, OllamaModel,
    ReasoningModel, VisionModel,
};

use crate::config::{ModelConfig, ModelProvider};
use crate::error::{PipelineError, PipelineResult};

/// Build the vision and reasoning handles described by `config`.
pub fn build_models(
    config: &ModelConfig,
    backend: ComputeBackend,
) -> PipelineResult<(Arc<dyn VisionModel>, Arc<dyn ReasoningModel>)> {
    let (vision, reasoning): (Arc<dyn VisionModel>, Arc<dyn ReasoningModel>) = match config.provider
    {
        ModelProvider::Ollama => {
            let concurrent = config.concurrent_override.unwrap_or(false);
            let vision = OllamaModel::new(&config.vision_model, backend, config.timeout)
                .map_err(|e| PipelineError::config(e.to_string()))?
                .with_base_url(&config.ollama_base_url)
                .with_concurrent_calls(concurrent);
            let reasoning = OllamaModel::new(&config.reasoning_model, backend, config.timeout)
                .map_err(|e| PipelineError::config(e.to_string()))?
                .with_base_url(&config.ollama_base_url)
                .with_concurrent_calls(concurrent);
            (Arc::new(vision), Arc::new(reasoning))
        }
        ModelProvider::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| PipelineError::config("GEMINI_API_KEY not set"))?;
            let vision = GeminiModel::new(api_key.clone(), &config.vision_model, config.timeout)
                .map_err(|e| PipelineError::config(e.to_string()))?
                .with_base_url(&config.gemini_base_url);
            let reasoning = GeminiModel::new(api_key, &config.reasoning_model, config.timeout)
                .map_err(|e| PipelineError::config(e.to_string()))?
                .with_base_url(&config.gemini_base_url);
            (Arc::new(vision), Arc::new(reasoning))
        }
    };

    info!(
        provider = ?config.provider,
        vision_model = %config.vision_model,
        reasoning_model = %config.reasoning_model,
        backend = %backend,
        vision_concurrent = vision.supports_concurrent_calls(),
        reasoning_concurrent = reasoning.supports_concurrent_calls(),
        "Model handles created"
    );

    Ok((serialize_vision(vision), serialize_reasoning(reasoning)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_requires_key() {
        let config = ModelConfig {
            provider: ModelProvider::Gemini,
            ..Default::default()
        };
        assert!(matches!(
            build_models(&config, ComputeBackend::Cpu),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_ollama_handles_are_serialized() {
        let (vision, reasoning) = build_models(&ModelConfig::default(), ComputeBackend::Cpu).unwrap();
        // Wrapped handles report themselves safe to share.
        assert!(vision.supports_concurrent_calls());
        assert!(reasoning.supports_concurrent_calls());
    }
}
