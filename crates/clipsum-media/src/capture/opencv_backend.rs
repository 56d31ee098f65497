//! Capture backend built on OpenCV `VideoCapture`.
//!
//! OpenCV calls block, so they run under `block_in_place`, which requires the
//! multi-threaded Tokio runtime.

use async_trait::async_trait;
use image::{DynamicImage, RgbImage};
use opencv::core::Mat;
use opencv::prelude::{MatTraitConst, MatTraitConstManual, VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_POS_MSEC};
use tokio::task::block_in_place;
use tracing::warn;

use super::{CaptureProvider, CaptureSession};
use crate::error::{MediaError, MediaResult};

/// [`CaptureProvider`] backed by OpenCV's video I/O module.
#[derive(Debug, Clone, Default)]
pub struct OpenCvCapture;

impl OpenCvCapture {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CaptureProvider for OpenCvCapture {
    async fn open(&self, media_url: &str) -> MediaResult<Box<dyn CaptureSession>> {
        let media_url = media_url.to_string();
        block_in_place(move || {
            let mut cap = VideoCapture::from_file(&media_url, CAP_ANY)
                .map_err(|e| MediaError::video_stream(format!("Open video: {e}")))?;

            if !cap.is_opened().unwrap_or(false) {
                // A failed open can still hold native resources.
                if let Err(e) = cap.release() {
                    warn!("Failed to release unopened capture: {}", e);
                }
                return Err(MediaError::video_stream("Failed to open video stream"));
            }

            Ok(Box::new(OpenCvSession {
                cap,
                released: false,
            }) as Box<dyn CaptureSession>)
        })
    }

    fn name(&self) -> &'static str {
        "opencv"
    }
}

struct OpenCvSession {
    cap: VideoCapture,
    released: bool,
}

#[async_trait]
impl CaptureSession for OpenCvSession {
    async fn seek(&mut self, timestamp_ms: f64) -> MediaResult<()> {
        if self.released {
            return Err(MediaError::video_stream("capture session already released"));
        }
        let accepted = block_in_place(|| self.cap.set(CAP_PROP_POS_MSEC, timestamp_ms))
            .map_err(|e| MediaError::video_stream(format!("Seek: {e}")))?;
        if !accepted {
            return Err(MediaError::video_stream(format!(
                "Stream rejected seek to {} ms",
                timestamp_ms
            )));
        }
        Ok(())
    }

    async fn read_frame(&mut self) -> MediaResult<Option<DynamicImage>> {
        if self.released {
            return Err(MediaError::video_stream("capture session already released"));
        }

        block_in_place(|| {
            let mut frame = Mat::default();
            let got = self
                .cap
                .read(&mut frame)
                .map_err(|e| MediaError::FrameDecode(format!("Read: {e}")))?;
            if !got || frame.empty() {
                return Ok(None);
            }

            let mut rgb = Mat::default();
            opencv::imgproc::cvt_color_def(&frame, &mut rgb, opencv::imgproc::COLOR_BGR2RGB)
                .map_err(|e| MediaError::FrameDecode(format!("Color conversion failed: {e}")))?;

            let width = rgb.cols() as u32;
            let height = rgb.rows() as u32;
            let data = rgb
                .data_bytes()
                .map_err(|e| MediaError::FrameDecode(format!("Failed to get frame data: {e}")))?;

            let image = RgbImage::from_raw(width, height, data.to_vec())
                .ok_or_else(|| MediaError::FrameDecode("Frame buffer size mismatch".to_string()))?;

            Ok(Some(DynamicImage::ImageRgb8(image)))
        })
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.cap.release() {
            warn!("Failed to release video capture: {}", e);
        }
    }
}
