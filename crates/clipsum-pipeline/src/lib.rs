//! Clip summary orchestration.
//!
//! Wires stream resolution, the duration gate, frame sampling, frame
//! description and summarization into a single fail-fast pipeline.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;

pub use config::{ModelConfig, ModelProvider, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use logging::ClipLogger;
pub use models::build_models;
pub use pipeline::{ClipPipeline, PipelineParts};
