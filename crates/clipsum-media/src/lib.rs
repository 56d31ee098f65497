//! Clip acquisition for the clip summary service.
//!
//! This crate provides:
//! - Stream resolution through yt-dlp
//! - The maximum-duration gate
//! - Seekable capture sessions (FFmpeg CLI by default, OpenCV behind a feature)
//! - Best-effort frame sampling with guaranteed session release
//! - Atomic JPEG persistence of captured frames

pub mod capture;
pub mod command;
pub mod error;
pub mod extract;
pub mod gate;
pub mod probe;
pub mod resolve;
pub mod storage;

pub use capture::{
    build_provider, CaptureBackend, CaptureProvider, CaptureSession, CaptureState, FfmpegCapture,
    SessionGuard,
};
#[cfg(feature = "opencv")]
pub use capture::OpenCvCapture;
pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use extract::FrameExtractor;
pub use gate::{enforce_max_duration, DEFAULT_MAX_CLIP_DURATION};
pub use probe::{probe_video, VideoInfo};
pub use resolve::{parse_metadata, StreamResolve, YtDlpOptions, YtDlpResolver};
pub use storage::{FrameStore, DEFAULT_FRAMES_DIR};
