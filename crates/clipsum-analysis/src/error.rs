//! Error types for frame analysis and summarization.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Result type for a single model invocation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Failures of a vision or reasoning model call.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response could not be decoded: {0}")]
    Decode(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model call timed out")]
    Timeout,

    #[error("model configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Why a single frame could not be described.
#[derive(Debug, Error)]
pub enum FrameFailure {
    #[error("file does not exist")]
    Missing,

    #[error("{0}")]
    Io(std::io::Error),

    #[error("unreadable image: {0}")]
    Decode(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Analysis-family errors surfaced to callers.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("An error occurred while analyzing the frame {}: {cause}.", .path.display())]
    FrameAnalysis {
        path: PathBuf,
        #[source]
        cause: FrameFailure,
    },

    #[error("An error occurred while summarizing the frame descriptions: {cause}.")]
    Summary {
        #[source]
        cause: ModelError,
    },
}

impl AnalysisError {
    /// Create a frame analysis error for `path`.
    pub fn frame(path: impl Into<PathBuf>, cause: impl Into<FrameFailure>) -> Self {
        Self::FrameAnalysis {
            path: path.into(),
            cause: cause.into(),
        }
    }

    /// Create a summary error.
    pub fn summary(cause: ModelError) -> Self {
        Self::Summary { cause }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_names_path() {
        let err = AnalysisError::frame("static/frames/abc123_50.jpg", FrameFailure::Missing);
        assert_eq!(
            err.to_string(),
            "An error occurred while analyzing the frame static/frames/abc123_50.jpg: file does not exist."
        );
    }

    #[test]
    fn test_model_cause_is_kept() {
        let err = AnalysisError::frame(
            "a.jpg",
            ModelError::Status {
                status: 503,
                body: "overloaded".to_string(),
            },
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("model returned HTTP 503: overloaded"));
    }
}
