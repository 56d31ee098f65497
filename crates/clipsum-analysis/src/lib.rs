//! Frame description and narrative summarization.
//!
//! This crate provides:
//! - Capability traits for vision and reasoning models
//! - Ollama and Gemini clients implementing them
//! - A serialization adapter for models that cannot take concurrent calls
//! - The sequential frame analyzer and the summarizer

pub mod backend;
pub mod error;
pub mod gemini;
pub mod model;
pub mod ollama;
pub mod serialized;
pub mod summarizer;
pub mod vision;

pub use backend::ComputeBackend;
pub use error::{AnalysisError, AnalysisResult, FrameFailure, ModelError, ModelResult};
pub use gemini::GeminiModel;
pub use model::{FrameImage, GenerationRequest, ReasoningModel, VisionModel};
pub use ollama::OllamaModel;
pub use serialized::{serialize_reasoning, serialize_vision, Serialized};
pub use summarizer::{clean_generation, Summarizer, DEFAULT_MAX_NEW_TOKENS, NO_FRAMES_SUMMARY};
pub use vision::{VisionAnalyzer, DEFAULT_VISION_PROMPT};
