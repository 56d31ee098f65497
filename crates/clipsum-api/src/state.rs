//! Application state.

use std::sync::Arc;

use clipsum_media::CaptureBackend;
use clipsum_pipeline::ClipPipeline;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<ClipPipeline>,
    /// Decides which external binaries readiness requires
    pub capture_backend: CaptureBackend,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: ClipPipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
            capture_backend: CaptureBackend::default(),
        }
    }

    pub fn with_capture_backend(mut self, backend: CaptureBackend) -> Self {
        self.capture_backend = backend;
        self
    }
}
