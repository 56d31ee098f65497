//! Seekable capture sessions over a media URL.
//!
//! A [`CaptureProvider`] opens a [`CaptureSession`]; callers never hold a raw
//! session but a [`SessionGuard`], which releases the underlying handle when
//! it goes out of scope. That covers early returns, errors, panics and a
//! cancelled future alike.
//!
//! Session lifecycle:
//!
//! ```text
//! open ──► Opened ──seek──► Seeking ──read──► Capturing ──► Opened ...
//!             └──────────────────── close / drop ─────────────► Closed
//! ```

pub mod ffmpeg;
#[cfg(feature = "opencv")]
pub mod opencv_backend;

use async_trait::async_trait;
use image::DynamicImage;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

pub use ffmpeg::FfmpegCapture;
#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvCapture;

/// Opens capture sessions.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Open `media_url` for seeking. On failure no session exists and any
    /// partially acquired handle has already been released.
    async fn open(&self, media_url: &str) -> MediaResult<Box<dyn CaptureSession>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// An open, seekable video stream.
#[async_trait]
pub trait CaptureSession: Send {
    /// Position the stream at `timestamp_ms` milliseconds from the start.
    async fn seek(&mut self, timestamp_ms: f64) -> MediaResult<()>;

    /// Decode one frame at the current position. `Ok(None)` means the stream
    /// produced no frame there.
    async fn read_frame(&mut self) -> MediaResult<Option<DynamicImage>>;

    /// Release the underlying handle. Must be idempotent.
    fn release(&mut self);
}

/// Where a guarded session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Opened,
    Seeking,
    Capturing,
    Closed,
}

/// Owns a [`CaptureSession`] and releases it exactly once.
pub struct SessionGuard {
    session: Box<dyn CaptureSession>,
    state: CaptureState,
}

impl SessionGuard {
    /// Open a session through `provider`.
    pub async fn open(provider: &dyn CaptureProvider, media_url: &str) -> MediaResult<Self> {
        let session = provider.open(media_url).await?;
        debug!(backend = provider.name(), "Capture session opened");
        Ok(Self {
            session,
            state: CaptureState::Opened,
        })
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Seek to `timestamp_ms` and read a single frame.
    pub async fn capture_at(&mut self, timestamp_ms: f64) -> MediaResult<Option<DynamicImage>> {
        if self.state == CaptureState::Closed {
            return Err(MediaError::video_stream("capture session already closed"));
        }

        self.state = CaptureState::Seeking;
        let result = match self.session.seek(timestamp_ms).await {
            Ok(()) => {
                self.state = CaptureState::Capturing;
                self.session.read_frame().await
            }
            Err(e) => Err(e),
        };
        self.state = CaptureState::Opened;
        result
    }

    /// Release the session. Safe to call more than once.
    pub fn close(&mut self) {
        if self.state != CaptureState::Closed {
            self.session.release();
            self.state = CaptureState::Closed;
            debug!("Capture session released");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Available capture backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureBackend {
    /// FFprobe to open, one FFmpeg invocation per frame
    #[default]
    Ffmpeg,
    /// OpenCV `VideoCapture` (requires the `opencv` feature)
    OpenCv,
}

impl fmt::Display for CaptureBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ffmpeg => write!(f, "ffmpeg"),
            Self::OpenCv => write!(f, "opencv"),
        }
    }
}

impl FromStr for CaptureBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ffmpeg" => Ok(Self::Ffmpeg),
            "opencv" => Ok(Self::OpenCv),
            other => Err(format!("unknown capture backend '{}'", other)),
        }
    }
}

/// Build the provider for `backend`.
pub fn build_provider(
    backend: CaptureBackend,
    timeout_secs: u64,
) -> MediaResult<Arc<dyn CaptureProvider>> {
    match backend {
        CaptureBackend::Ffmpeg => Ok(Arc::new(FfmpegCapture::new(timeout_secs))),
        #[cfg(feature = "opencv")]
        CaptureBackend::OpenCv => Ok(Arc::new(OpenCvCapture::new())),
        #[cfg(not(feature = "opencv"))]
        CaptureBackend::OpenCv => Err(MediaError::video_stream(
            "the opencv capture backend is not compiled in (enable the `opencv` feature)",
        )),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted capture doubles shared by unit tests.

    use super::*;
    use image::RgbImage;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records how a [`FakeCapture`] was used.
    #[derive(Debug, Default)]
    pub struct CaptureLog {
        pub opens: AtomicUsize,
        pub releases: AtomicUsize,
        pub seeks: Mutex<Vec<f64>>,
    }

    /// Provider whose sessions return a tiny frame unless told to fail.
    #[derive(Debug, Default, Clone)]
    pub struct FakeCapture {
        pub log: Arc<CaptureLog>,
        pub fail_open: bool,
        /// Timestamps (ms, rounded) at which `read_frame` errors
        pub failing_reads: HashSet<u64>,
        /// Timestamps (ms, rounded) at which `read_frame` yields nothing
        pub empty_reads: HashSet<u64>,
    }

    struct FakeSession {
        log: Arc<CaptureLog>,
        position: u64,
        failing_reads: HashSet<u64>,
        empty_reads: HashSet<u64>,
        released: bool,
    }

    #[async_trait]
    impl CaptureProvider for FakeCapture {
        async fn open(&self, _media_url: &str) -> MediaResult<Box<dyn CaptureSession>> {
            self.log.opens.fetch_add(1, Ordering::SeqCst);
            if self.fail_open {
                return Err(MediaError::video_stream("connection refused"));
            }
            Ok(Box::new(FakeSession {
                log: self.log.clone(),
                position: 0,
                failing_reads: self.failing_reads.clone(),
                empty_reads: self.empty_reads.clone(),
                released: false,
            }))
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    #[async_trait]
    impl CaptureSession for FakeSession {
        async fn seek(&mut self, timestamp_ms: f64) -> MediaResult<()> {
            self.log.seeks.lock().unwrap().push(timestamp_ms);
            self.position = timestamp_ms.round() as u64;
            Ok(())
        }

        async fn read_frame(&mut self) -> MediaResult<Option<DynamicImage>> {
            if self.failing_reads.contains(&self.position) {
                return Err(MediaError::FrameDecode("corrupt packet".to_string()));
            }
            if self.empty_reads.contains(&self.position) {
                return Ok(None);
            }
            Ok(Some(DynamicImage::ImageRgb8(RgbImage::new(4, 4))))
        }

        fn release(&mut self) {
            if !self.released {
                self.released = true;
                self.log.releases.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}
