//! Pipeline error types.

use thiserror::Error;

use clipsum_analysis::AnalysisError;
use clipsum_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything `ClipPipeline` can fail with. Stage errors pass through
/// unchanged so callers can still tell which stage failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller's input caused the failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Media(e) => e.is_client_error(),
            Self::Analysis(_) | Self::Config(_) => false,
        }
    }

    /// Stage label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Media(MediaError::StreamResolution { .. }) => "stream_resolution",
            Self::Media(MediaError::ClipTooLong { .. }) => "clip_too_long",
            Self::Media(MediaError::FrameStorage { .. }) => "frame_storage",
            Self::Media(_) => "video_stream",
            Self::Analysis(AnalysisError::FrameAnalysis { .. }) => "frame_analysis",
            Self::Analysis(AnalysisError::Summary { .. }) => "summary",
            Self::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_pass_through_unchanged() {
        let err: PipelineError = MediaError::clip_too_long(45.0, 30.0).into();
        assert_eq!(
            err.to_string(),
            "The clip to be analyzed is too long. Current length is 45 but maximum allowed is 30."
        );
        assert!(err.is_client_error());
        assert_eq!(err.kind(), "clip_too_long");

        let err: PipelineError = MediaError::stream_resolution("private video").into();
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "stream_resolution");
    }
}
