//! Frame persistence.
//!
//! Frames are encoded to a uniquely named hidden file in the target directory
//! and renamed into place, so a partially written JPEG is never visible under
//! its final name, even when two requests store the same frame at once.

use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tokio::fs;

use clipsum_models::frame_filename;

use crate::error::{MediaError, MediaResult};

/// Default directory for captured frames.
pub const DEFAULT_FRAMES_DIR: &str = "static/frames";

/// Writes captured frames under a single directory.
#[derive(Debug, Clone)]
pub struct FrameStore {
    dir: PathBuf,
}

impl FrameStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the frames directory if needed.
    pub async fn ensure_dir(&self) -> MediaResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MediaError::frame_storage(&self.dir, e.to_string()))
    }

    /// Whether frames can currently be written.
    pub async fn is_writable(&self) -> bool {
        if self.ensure_dir().await.is_err() {
            return false;
        }
        match fs::metadata(&self.dir).await {
            Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }

    /// Final location of the frame for `clip_id` at `offset`.
    pub fn path_for(&self, clip_id: &str, offset: f64) -> PathBuf {
        self.dir.join(frame_filename(clip_id, offset))
    }

    /// Encode `image` as JPEG at `path`, replacing any previous file.
    ///
    /// Every call writes its own temporary file, so concurrent saves of the
    /// same frame never share a partial file; the last rename wins.
    pub async fn save_jpeg(&self, image: DynamicImage, path: &Path) -> MediaResult<()> {
        let target = path.to_path_buf();

        let result = tokio::task::spawn_blocking({
            let target = target.clone();
            move || write_atomically(&image, &target)
        })
        .await
        .map_err(|e| e.to_string())
        .and_then(|r| r);

        result.map_err(|message| MediaError::frame_storage(target, message))
    }
}

/// Encode into a uniquely named hidden file next to `target`, then rename it
/// into place. The temporary file is removed on every failure path.
fn write_atomically(image: &DynamicImage, target: &Path) -> Result<(), String> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}.",
        target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "frame".to_string())
    );

    let tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| e.to_string())?;

    // JPEG has no alpha channel.
    image
        .to_rgb8()
        .save_with_format(tmp.path(), ImageFormat::Jpeg)
        .map_err(|e| e.to_string())?;

    tmp.persist(target).map_err(|e| e.error.to_string())?;
    Ok(())
}
