//! Sequential per-frame description.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{AnalysisError, AnalysisResult, FrameFailure};
use crate::model::{FrameImage, VisionModel};

/// Prompt sent with every frame.
pub const DEFAULT_VISION_PROMPT: &str = "Describe what is happening in this image.";

/// Describes frames one at a time, in order.
#[derive(Clone)]
pub struct VisionAnalyzer {
    model: Arc<dyn VisionModel>,
    prompt: String,
}

impl VisionAnalyzer {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model,
            prompt: DEFAULT_VISION_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// One description per path, same order. The first failing frame fails
    /// the whole call and names its path.
    pub async fn describe_all(&self, paths: &[PathBuf]) -> AnalysisResult<Vec<String>> {
        let mut descriptions = Vec::with_capacity(paths.len());

        for path in paths {
            let start = Instant::now();
            let description = self.describe_one(path).await?;
            debug!(
                path = %path.display(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Frame described"
            );
            metrics::histogram!("clipsum_frame_analysis_seconds")
                .record(start.elapsed().as_secs_f64());
            descriptions.push(description);
        }

        info!(frames = descriptions.len(), "Frame analysis complete");
        Ok(descriptions)
    }

    async fn describe_one(&self, path: &Path) -> AnalysisResult<String> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            let cause = if e.kind() == ErrorKind::NotFound {
                FrameFailure::Missing
            } else {
                FrameFailure::Io(e)
            };
            AnalysisError::frame(path, cause)
        })?;

        let image = FrameImage::from_bytes(bytes).map_err(|cause| AnalysisError::frame(path, cause))?;

        let description = self
            .model
            .describe(&image, &self.prompt)
            .await
            .map_err(|e| AnalysisError::frame(path, e))?;

        Ok(description.trim().to_string())
    }
}
