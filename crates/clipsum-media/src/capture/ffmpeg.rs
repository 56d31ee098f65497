//! Capture backend built on the FFmpeg CLI.
//!
//! Opening probes the URL once with ffprobe. Each read spawns a short FFmpeg
//! process that seeks, decodes a single frame and pipes it back as PNG. No
//! process outlives a read, so releasing only has to close the session.

use async_trait::async_trait;
use image::DynamicImage;
use tracing::debug;

use super::{CaptureProvider, CaptureSession};
use crate::command::{FfmpegCommand, FfmpegRunner, PIPE_STDOUT};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// [`CaptureProvider`] that shells out to ffprobe/ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegCapture {
    timeout_secs: u64,
}

impl FfmpegCapture {
    /// `timeout_secs` bounds the open probe and every frame grab.
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl CaptureProvider for FfmpegCapture {
    async fn open(&self, media_url: &str) -> MediaResult<Box<dyn CaptureSession>> {
        let info = probe_video(media_url, Some(self.timeout_secs))
            .await
            .map_err(|e| MediaError::video_stream(e.to_string()))?;

        debug!(
            width = info.width,
            height = info.height,
            codec = %info.codec,
            "Probed media stream"
        );

        Ok(Box::new(FfmpegSession {
            media_url: media_url.to_string(),
            position_secs: 0.0,
            runner: FfmpegRunner::new().with_timeout(self.timeout_secs),
            released: false,
        }))
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

struct FfmpegSession {
    media_url: String,
    position_secs: f64,
    runner: FfmpegRunner,
    released: bool,
}

impl FfmpegSession {
    fn ensure_open(&self) -> MediaResult<()> {
        if self.released {
            return Err(MediaError::video_stream("capture session already released"));
        }
        Ok(())
    }
}

#[async_trait]
impl CaptureSession for FfmpegSession {
    async fn seek(&mut self, timestamp_ms: f64) -> MediaResult<()> {
        self.ensure_open()?;
        if !timestamp_ms.is_finite() || timestamp_ms < 0.0 {
            return Err(MediaError::video_stream(format!(
                "invalid seek position {} ms",
                timestamp_ms
            )));
        }
        self.position_secs = timestamp_ms / 1000.0;
        Ok(())
    }

    async fn read_frame(&mut self) -> MediaResult<Option<DynamicImage>> {
        self.ensure_open()?;

        let cmd = FfmpegCommand::new(self.media_url.clone(), PIPE_STDOUT)
            .seek(self.position_secs)
            .single_frame()
            .format("image2pipe")
            .video_codec("png");

        let bytes = self.runner.output(&cmd).await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        image::load_from_memory(&bytes)
            .map(Some)
            .map_err(|e| MediaError::FrameDecode(e.to_string()))
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> FfmpegSession {
        FfmpegSession {
            media_url: "https://cdn.example.com/v.mp4".to_string(),
            position_secs: 0.0,
            runner: FfmpegRunner::new(),
            released: false,
        }
    }

    #[tokio::test]
    async fn test_seek_converts_to_seconds() {
        let mut s = session();
        s.seek(6000.0).await.unwrap();
        assert!((s.position_secs - 6.0).abs() < f64::EPSILON);
        assert!(s.seek(-1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_released_session_refuses_work() {
        let mut s = session();
        s.release();
        s.release();
        assert!(matches!(s.seek(0.0).await, Err(MediaError::VideoStream { .. })));
        assert!(matches!(s.read_frame().await, Err(MediaError::VideoStream { .. })));
    }
}
