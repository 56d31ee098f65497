//! Frame sampling at fixed relative offsets.

use std::sync::Arc;
use tracing::{info, warn};

use clipsum_models::{SampleOffsets, SampledFrame};

use crate::capture::{CaptureProvider, SessionGuard};
use crate::error::{MediaError, MediaResult};
use crate::storage::FrameStore;

/// Captures and stores one frame per offset.
///
/// Sampling is best-effort: an offset whose seek or read fails is skipped
/// with a warning and the result simply has fewer frames. Failing to open
/// the stream, or failing to write a captured frame, aborts the whole call.
#[derive(Clone)]
pub struct FrameExtractor {
    provider: Arc<dyn CaptureProvider>,
    store: FrameStore,
}

impl FrameExtractor {
    pub fn new(provider: Arc<dyn CaptureProvider>, store: FrameStore) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    /// Sample `media_url` at each offset in ascending order.
    pub async fn extract(
        &self,
        clip_id: &str,
        duration_seconds: f64,
        media_url: &str,
        offsets: &SampleOffsets,
    ) -> MediaResult<Vec<SampledFrame>> {
        let mut session = SessionGuard::open(self.provider.as_ref(), media_url)
            .await
            .map_err(|e| match e {
                MediaError::VideoStream { .. } => e,
                other => MediaError::video_stream(other.to_string()),
            })?;

        self.store.ensure_dir().await?;

        let mut frames = Vec::with_capacity(offsets.len());

        for offset in offsets.iter() {
            let timestamp_ms = duration_seconds * offset * 1000.0;

            let image = match session.capture_at(timestamp_ms).await {
                Ok(Some(image)) => image,
                Ok(None) => {
                    warn!(clip_id, offset, timestamp_ms, "No frame at offset, skipping");
                    metrics::counter!("clipsum_frames_skipped_total").increment(1);
                    continue;
                }
                Err(e) => {
                    warn!(clip_id, offset, timestamp_ms, error = %e, "Frame capture failed, skipping");
                    metrics::counter!("clipsum_frames_skipped_total").increment(1);
                    continue;
                }
            };

            let path = self.store.path_for(clip_id, offset);
            self.store.save_jpeg(image, &path).await?;

            frames.push(SampledFrame {
                offset_fraction: offset,
                storage_path: path,
            });
        }

        session.close();

        info!(
            clip_id,
            captured = frames.len(),
            requested = offsets.len(),
            backend = self.provider.name(),
            "Frame extraction complete"
        );
        metrics::counter!("clipsum_frames_captured_total").increment(frames.len() as u64);

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::testing::FakeCapture;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn offsets() -> SampleOffsets {
        SampleOffsets::new(vec![0.10, 0.50, 0.90]).unwrap()
    }

    fn extractor(provider: FakeCapture, dir: &TempDir) -> FrameExtractor {
        FrameExtractor::new(Arc::new(provider), FrameStore::new(dir.path()))
    }

    fn files_in(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_all_offsets_captured() {
        let dir = TempDir::new().unwrap();
        let provider = FakeCapture::default();
        let log = provider.log.clone();

        let frames = extractor(provider, &dir)
            .extract("abc123", 12.0, "https://x/abc.mp4", &offsets())
            .await
            .unwrap();

        let paths: Vec<PathBuf> = frames.iter().map(|f| f.storage_path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("abc123_10.jpg"),
                dir.path().join("abc123_50.jpg"),
                dir.path().join("abc123_90.jpg"),
            ]
        );
        assert_eq!(files_in(&dir), vec!["abc123_10.jpg", "abc123_50.jpg", "abc123_90.jpg"]);

        let seeks = log.seeks.lock().unwrap().clone();
        assert_eq!(seeks.len(), 3);
        assert!((seeks[0] - 1200.0).abs() < 1e-6);
        assert!((seeks[1] - 6000.0).abs() < 1e-6);
        assert!((seeks[2] - 10800.0).abs() < 1e-6);
        assert_eq!(log.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_offset_is_skipped() {
        let dir = TempDir::new().unwrap();
        let provider = FakeCapture {
            failing_reads: HashSet::from([6000]),
            empty_reads: HashSet::from([10800]),
            ..Default::default()
        };
        let log = provider.log.clone();

        let frames = extractor(provider, &dir)
            .extract("abc123", 12.0, "https://x/abc.mp4", &offsets())
            .await
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].offset_fraction, 0.10);
        assert_eq!(files_in(&dir), vec!["abc123_10.jpg"]);
        assert_eq!(log.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let provider = FakeCapture {
            fail_open: true,
            ..Default::default()
        };

        let err = extractor(provider, &dir)
            .extract("abc123", 12.0, "https://x/abc.mp4", &offsets())
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::VideoStream { .. }));
        assert!(files_in(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_and_releases() {
        let dir = TempDir::new().unwrap();
        // A regular file where the frames directory should be.
        let blocker = dir.path().join("frames");
        std::fs::write(&blocker, b"").unwrap();

        let provider = FakeCapture::default();
        let log = provider.log.clone();
        let extractor = FrameExtractor::new(Arc::new(provider), FrameStore::new(&blocker));

        let err = extractor
            .extract("abc123", 12.0, "https://x/abc.mp4", &offsets())
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::FrameStorage { .. }));
        assert_eq!(log.releases.load(Ordering::SeqCst), 1);
    }
}
