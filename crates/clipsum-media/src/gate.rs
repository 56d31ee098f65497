//! Duration ceiling enforced before any frame is captured.

use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Default maximum clip length in seconds.
pub const DEFAULT_MAX_CLIP_DURATION: f64 = 30.0;

/// Reject clips longer than `max_allowed` seconds. Equal passes.
pub fn enforce_max_duration(duration_seconds: f64, max_allowed: f64) -> MediaResult<()> {
    if duration_seconds > max_allowed {
        warn!(
            duration = duration_seconds,
            max_allowed, "Clip rejected: exceeds maximum duration"
        );
        return Err(MediaError::clip_too_long(duration_seconds, max_allowed));
    }
    Ok(())
}
