//! Sampling offsets and frame file naming.
//!
//! Offsets are fractions of the clip duration in the open interval `(0, 1)`.
//! Each offset maps to an integer percentage that becomes part of the frame
//! file name, so two offsets may never share a percentage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default sampling points: every tenth of the clip from 10% to 90%.
pub const DEFAULT_OFFSETS: [f64; 9] = [0.10, 0.20, 0.30, 0.40, 0.50, 0.60, 0.70, 0.80, 0.90];

/// Errors raised when building a [`SampleOffsets`] list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OffsetError {
    #[error("At least one sampling offset is required")]
    Empty,

    #[error("Offset {0} is outside the open interval (0, 1)")]
    OutOfRange(f64),

    #[error("Offsets must be strictly increasing ({previous} is followed by {next})")]
    NotIncreasing { previous: f64, next: f64 },

    #[error("Offsets {first} and {second} both map to frame percentage {percent}")]
    DuplicatePercent { first: f64, second: f64, percent: u32 },

    #[error("Invalid offset value: {0}")]
    Parse(String),
}

/// Ordered, validated list of relative sampling offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct SampleOffsets(Vec<f64>);

impl SampleOffsets {
    /// Validate and wrap a list of offsets.
    pub fn new(offsets: Vec<f64>) -> Result<Self, OffsetError> {
        if offsets.is_empty() {
            return Err(OffsetError::Empty);
        }

        for &offset in &offsets {
            if !offset.is_finite() || offset <= 0.0 || offset >= 1.0 {
                return Err(OffsetError::OutOfRange(offset));
            }
        }

        for pair in offsets.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            if next <= previous {
                return Err(OffsetError::NotIncreasing { previous, next });
            }
            if offset_percent(previous) == offset_percent(next) {
                return Err(OffsetError::DuplicatePercent {
                    first: previous,
                    second: next,
                    percent: offset_percent(next),
                });
            }
        }

        Ok(Self(offsets))
    }

    /// Parse a comma-separated list such as `"0.1, 0.5, 0.9"`.
    pub fn parse_list(raw: &str) -> Result<Self, OffsetError> {
        let offsets = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().map_err(|_| OffsetError::Parse(s.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(offsets)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

impl Default for SampleOffsets {
    fn default() -> Self {
        Self(DEFAULT_OFFSETS.to_vec())
    }
}

impl TryFrom<Vec<f64>> for SampleOffsets {
    type Error = OffsetError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SampleOffsets> for Vec<f64> {
    fn from(value: SampleOffsets) -> Self {
        value.0
    }
}

/// Integer percentage used in frame file names (`0.10` -> `10`).
///
/// Rounds rather than truncates so that `0.29` stays `29` despite binary
/// floating point representing it as `28.999...` after scaling.
pub fn offset_percent(offset: f64) -> u32 {
    (offset * 100.0).round() as u32
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
///
/// Clip ids come from remote metadata and end up in file names. When an id
/// had to be rewritten, a short digest of the raw id is appended so that
/// `a.b` and `a_b` never share frame files.
pub fn sanitize_clip_id(clip_id: &str) -> String {
    if clip_id.is_empty() {
        return "unknown".to_string();
    }

    let sanitized: String = clip_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized == clip_id {
        return sanitized;
    }

    let digest = format!("{:x}", Sha256::digest(clip_id.as_bytes()));
    format!("{}-{}", sanitized, &digest[..8])
}

/// Deterministic frame file name: `{clip_id}_{percent}.jpg`.
pub fn frame_filename(clip_id: &str, offset: f64) -> String {
    format!("{}_{}.jpg", sanitize_clip_id(clip_id), offset_percent(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offsets_are_valid() {
        let offsets = SampleOffsets::default();
        assert_eq!(offsets.len(), 9);
        assert!(SampleOffsets::new(offsets.as_slice().to_vec()).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(SampleOffsets::new(vec![]), Err(OffsetError::Empty));
        assert_eq!(
            SampleOffsets::new(vec![0.0, 0.5]),
            Err(OffsetError::OutOfRange(0.0))
        );
        assert_eq!(
            SampleOffsets::new(vec![0.5, 1.0]),
            Err(OffsetError::OutOfRange(1.0))
        );
        assert!(SampleOffsets::new(vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_rejects_unordered_and_colliding_offsets() {
        assert!(matches!(
            SampleOffsets::new(vec![0.5, 0.1]),
            Err(OffsetError::NotIncreasing { .. })
        ));
        assert!(matches!(
            SampleOffsets::new(vec![0.101, 0.104]),
            Err(OffsetError::DuplicatePercent { percent: 10, .. })
        ));
    }

    #[test]
    fn test_parse_list() {
        let offsets = SampleOffsets::parse_list("0.1, 0.5,0.9").unwrap();
        assert_eq!(offsets.as_slice(), &[0.1, 0.5, 0.9]);
        assert_eq!(
            SampleOffsets::parse_list("0.1,abc"),
            Err(OffsetError::Parse("abc".to_string()))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: SampleOffsets = serde_json::from_str("[0.25, 0.75]").unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<SampleOffsets>("[0.75, 0.25]").is_err());
    }

    #[test]
    fn test_frame_filename() {
        assert_eq!(frame_filename("abc123", 0.10), "abc123_10.jpg");
        assert_eq!(frame_filename("abc123", 0.50), "abc123_50.jpg");
        assert_eq!(frame_filename("abc123", 0.90), "abc123_90.jpg");
        assert_eq!(frame_filename("abc123", 0.29), "abc123_29.jpg");
    }

    #[test]
    fn test_sanitize_clip_id() {
        assert_eq!(sanitize_clip_id("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(sanitize_clip_id("abc-1_2"), "abc-1_2");
        assert_eq!(sanitize_clip_id(""), "unknown");

        let traversal = sanitize_clip_id("../etc/passwd");
        assert!(traversal.starts_with("___etc_passwd-"));
        assert_eq!(traversal.len(), "___etc_passwd-".len() + 8);
        assert!(!traversal.contains('/') && !traversal.contains('.'));
    }

    #[test]
    fn test_rewritten_ids_do_not_collide() {
        let dotted = sanitize_clip_id("a.b");
        assert_ne!(dotted, sanitize_clip_id("a_b"));
        assert_ne!(dotted, sanitize_clip_id("a:b"));
        assert_eq!(dotted, sanitize_clip_id("a.b"));
        assert_ne!(frame_filename("a.b", 0.5), frame_filename("a_b", 0.5));
    }
}
