//! Pipeline metrics.

use std::time::Duration;

/// Metric names.
pub mod names {
    pub const STAGE_DURATION: &str = "clipsum_stage_duration_seconds";
    pub const CLIPS_TOTAL: &str = "clipsum_clips_total";
    pub const CLIP_FRAMES: &str = "clipsum_clip_frames";
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Extract,
    Analyze,
    Summarize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::Extract => "extract",
            Stage::Analyze => "analyze",
            Stage::Summarize => "summarize",
        }
    }
}

pub fn record_stage(stage: Stage, elapsed: Duration) {
    ::metrics::histogram!(names::STAGE_DURATION, "stage" => stage.as_str())
        .record(elapsed.as_secs_f64());
}

/// Count a finished run. `outcome` is `"success"` or an error kind.
pub fn record_outcome(outcome: &'static str) {
    ::metrics::counter!(names::CLIPS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_frame_count(frames: usize) {
    ::metrics::histogram!(names::CLIP_FRAMES).record(frames as f64);
}
