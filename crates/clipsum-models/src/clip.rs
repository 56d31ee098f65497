//! Clip processing models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for a resolved media stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StreamInfo {
    /// Source-provided identifier, `"unknown"` when the source has none
    pub id: String,
    /// Clip length in seconds, always positive
    pub duration_seconds: f64,
    /// Directly playable media URL
    pub media_url: String,
}

/// One successfully captured and persisted frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SampledFrame {
    /// Relative position in the clip, in `(0, 1)`
    pub offset_fraction: f64,
    /// Where the JPEG was written
    pub storage_path: PathBuf,
}

/// Output of the acquisition stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessedClip {
    pub clip_id: String,
    pub duration_seconds: f64,
    /// Frame paths in ascending offset order
    pub frame_paths: Vec<PathBuf>,
}

impl ProcessedClip {
    pub fn new(info: &StreamInfo, frames: &[SampledFrame]) -> Self {
        Self {
            clip_id: info.id.clone(),
            duration_seconds: info.duration_seconds,
            frame_paths: frames.iter().map(|f| f.storage_path.clone()).collect(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_paths.len()
    }
}

/// Description of a single frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FrameAnalysis {
    pub path: String,
    pub description: String,
}

/// Final result returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipResult {
    pub clip_id: String,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    pub frames: Vec<FrameAnalysis>,
    pub summary: String,
}

impl ClipResult {
    /// Pair each frame path with its description, index for index.
    ///
    /// Callers guarantee `descriptions.len() == clip.frame_paths.len()`.
    pub fn assemble(clip: ProcessedClip, descriptions: Vec<String>, summary: String) -> Self {
        let frames = clip
            .frame_paths
            .iter()
            .zip(descriptions)
            .map(|(path, description)| FrameAnalysis {
                path: path.to_string_lossy().to_string(),
                description,
            })
            .collect();

        Self {
            clip_id: clip.clip_id,
            duration_seconds: clip.duration_seconds,
            frames,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> ProcessedClip {
        let info = StreamInfo {
            id: "abc123".to_string(),
            duration_seconds: 12.0,
            media_url: "https://cdn.example.com/v.mp4".to_string(),
        };
        let frames = vec![
            SampledFrame {
                offset_fraction: 0.1,
                storage_path: PathBuf::from("static/frames/abc123_10.jpg"),
            },
            SampledFrame {
                offset_fraction: 0.5,
                storage_path: PathBuf::from("static/frames/abc123_50.jpg"),
            },
        ];
        ProcessedClip::new(&info, &frames)
    }

    #[test]
    fn test_processed_clip_keeps_order() {
        let clip = clip();
        assert_eq!(clip.frame_count(), 2);
        assert_eq!(clip.frame_paths[0], PathBuf::from("static/frames/abc123_10.jpg"));
        assert_eq!(clip.frame_paths[1], PathBuf::from("static/frames/abc123_50.jpg"));
    }

    #[test]
    fn test_clip_result_wire_shape() {
        let result = ClipResult::assemble(
            clip(),
            vec!["a dog".to_string(), "a ball".to_string()],
            "A dog chases a ball.".to_string(),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["clip_id"], "abc123");
        assert_eq!(json["duration"], 12.0);
        assert_eq!(json["frames"][0]["path"], "static/frames/abc123_10.jpg");
        assert_eq!(json["frames"][1]["description"], "a ball");
        assert_eq!(json["summary"], "A dog chases a ball.");
        assert!(json.get("duration_seconds").is_none());
    }
}
