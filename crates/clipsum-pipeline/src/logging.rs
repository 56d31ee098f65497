//! Structured clip logging utilities.
//!
//! Provides consistent, structured logging for one pipeline run with a
//! tracing span that picks up the clip id once the stream is resolved.

use tracing::{error, field, info, warn, Span};

/// Clip logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct ClipLogger {
    url: String,
    clip_id: Option<String>,
    span: Span,
}

impl ClipLogger {
    /// Create a logger (and its span) for a request on `url`.
    pub fn new(url: &str) -> Self {
        let span = tracing::info_span!("clip", url = %url, clip_id = field::Empty);
        Self {
            url: url.to_string(),
            clip_id: None,
            span,
        }
    }

    /// Attach the resolved clip id to this logger and its span.
    pub fn set_clip_id(&mut self, clip_id: &str) {
        self.span.record("clip_id", clip_id);
        self.clip_id = Some(clip_id.to_string());
    }

    pub fn clip_id(&self) -> &str {
        self.clip_id.as_deref().unwrap_or("-")
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Span to instrument the pipeline future with.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn log_start(&self, message: &str) {
        info!(clip_id = %self.clip_id(), url = %self.url, "Clip started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(clip_id = %self.clip_id(), "Clip progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(clip_id = %self.clip_id(), "Clip warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(clip_id = %self.clip_id(), url = %self.url, "Clip error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(clip_id = %self.clip_id(), "Clip completed: {}", message);
    }
}
