//! Shared data models for the clip summary service.
//!
//! This crate provides Serde-serializable types for:
//! - Resolved stream metadata and sampled frames
//! - Validated sampling offsets and deterministic frame naming
//! - Per-frame analysis and the final clip result
//! - The HTTP request schema

pub mod clip;
pub mod offsets;
pub mod request;

// Re-export common types
pub use clip::{ClipResult, FrameAnalysis, ProcessedClip, SampledFrame, StreamInfo};
pub use offsets::{frame_filename, sanitize_clip_id, OffsetError, SampleOffsets, DEFAULT_OFFSETS};
pub use request::{ClipRequest, MAX_URL_LENGTH};
