//! Narrative summary over ordered frame descriptions.

use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::info;

use crate::error::{AnalysisError, AnalysisResult, ModelError};
use crate::model::{GenerationRequest, ReasoningModel};

/// Default generation budget for the summary.
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 200;

/// Summary returned when no frame could be captured.
pub const NO_FRAMES_SUMMARY: &str = "No frames could be captured from this clip.";

/// Chat template markers (`<|end|>`, `<|assistant|>`, ...) and sentence tokens.
static CONTROL_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|[^|>]*\|>|</?s>").unwrap());

/// Condenses frame descriptions into a short story.
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn ReasoningModel>,
    max_new_tokens: u32,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ReasoningModel>) -> Self {
        Self {
            model,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    /// Summarize `descriptions`, given in chronological order.
    pub async fn summarize(&self, descriptions: &[String]) -> AnalysisResult<String> {
        if descriptions.is_empty() {
            return Ok(NO_FRAMES_SUMMARY.to_string());
        }

        let request = GenerationRequest {
            prompt: build_prompt(descriptions),
            max_new_tokens: self.max_new_tokens,
            greedy: true,
        };

        let raw = self
            .model
            .generate(&request)
            .await
            .map_err(AnalysisError::summary)?;

        let summary = clean_generation(&raw);
        if summary.is_empty() {
            return Err(AnalysisError::summary(ModelError::EmptyResponse));
        }

        info!(
            frames = descriptions.len(),
            chars = summary.len(),
            "Summary generated"
        );
        Ok(summary)
    }
}

/// Prompt listing each description as a numbered chronological frame.
pub fn build_prompt(descriptions: &[String]) -> String {
    let frames = descriptions
        .iter()
        .enumerate()
        .map(|(i, d)| format!("Frame {}: {}", i + 1, d.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "The following are descriptions of frames sampled in chronological order from a short video clip.\n\
         \n\
         {frames}\n\
         \n\
         Write a short, cohesive narrative of what happens in the clip. \
         Cover every frame in order and do not invent events that are not described."
    )
}

/// Strip control tokens and surrounding whitespace from generated text.
pub fn clean_generation(raw: &str) -> String {
    CONTROL_TOKENS.replace_all(raw, "").trim().to_string()
}
