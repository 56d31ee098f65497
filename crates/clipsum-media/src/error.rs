//! Error types for clip acquisition.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while acquiring a clip.
///
/// The first three variants are the acquisition family surfaced to callers.
/// The remaining ones are produced by process plumbing and are converted into
/// one of those by the component that invoked the tool.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Could not resolve a playable stream: {message}")]
    StreamResolution { message: String },

    #[error("Could not open the video stream: {message}")]
    VideoStream { message: String },

    #[error(
        "The clip to be analyzed is too long. Current length is {duration} but maximum allowed is {max_duration}."
    )]
    ClipTooLong { duration: f64, max_duration: f64 },

    #[error("Failed to store frame {path}: {message}")]
    FrameStorage { path: PathBuf, message: String },

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Frame decode failed: {0}")]
    FrameDecode(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a stream resolution error.
    pub fn stream_resolution(message: impl Into<String>) -> Self {
        Self::StreamResolution {
            message: message.into(),
        }
    }

    /// Create a video stream error.
    pub fn video_stream(message: impl Into<String>) -> Self {
        Self::VideoStream {
            message: message.into(),
        }
    }

    /// Create a clip-too-long error.
    pub fn clip_too_long(duration: f64, max_duration: f64) -> Self {
        Self::ClipTooLong {
            duration,
            max_duration,
        }
    }

    /// Create a frame storage error.
    pub fn frame_storage(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FrameStorage {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Whether the failure was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ClipTooLong { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_too_long_message() {
        let err = MediaError::clip_too_long(45.0, 30.0);
        assert_eq!(
            err.to_string(),
            "The clip to be analyzed is too long. Current length is 45 but maximum allowed is 30."
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_side_errors() {
        assert!(!MediaError::stream_resolution("no url").is_client_error());
        assert!(!MediaError::video_stream("refused").is_client_error());
        assert!(!MediaError::frame_storage("/tmp/x.jpg", "disk full").is_client_error());
    }
}
