//! Model capability traits.
//!
//! The pipeline only sees these traits. Handles are created once at startup
//! and shared; each declares whether it tolerates overlapping calls so the
//! caller can serialize access when it does not.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;

use crate::error::{FrameFailure, ModelResult};

/// Encoded image handed to a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl FrameImage {
    /// Wrap encoded image bytes after checking they decode as JPEG or PNG.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FrameFailure> {
        if bytes.is_empty() {
            return Err(FrameFailure::Decode("file is empty".to_string()));
        }

        let format = image::guess_format(&bytes).map_err(|e| FrameFailure::Decode(e.to_string()))?;
        let mime_type = match format {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            other => {
                return Err(FrameFailure::Decode(format!(
                    "unsupported image format {:?}",
                    other
                )))
            }
        };

        // A valid header says nothing about the rest of the file.
        image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| FrameFailure::Decode(e.to_string()))?;

        Ok(Self { bytes, mime_type })
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Text generation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    /// Always pick the most likely token (no sampling)
    pub greedy: bool,
}

/// Describes a single image.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Answer `prompt` about `image` deterministically.
    async fn describe(&self, image: &FrameImage, prompt: &str) -> ModelResult<String>;

    /// Whether overlapping `describe` calls are safe.
    fn supports_concurrent_calls(&self) -> bool;
}

/// Generates text from a prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    /// Raw generated text, control tokens included.
    async fn generate(&self, request: &GenerationRequest) -> ModelResult<String>;

    /// Whether overlapping `generate` calls are safe.
    fn supports_concurrent_calls(&self) -> bool;
}
