//! HTTP request schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum accepted URL length.
pub const MAX_URL_LENGTH: u64 = 2048;

/// Body of `POST /v1/process`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ClipRequest {
    /// Video page or media URL to summarize
    #[validate(length(min = 1, max = 2048), url)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_request() {
        let ok = ClipRequest {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = ClipRequest { url: String::new() };
        assert!(empty.validate().is_err());

        let not_a_url = ClipRequest {
            url: "just some words".to_string(),
        };
        assert!(not_a_url.validate().is_err());

        let too_long = ClipRequest {
            url: format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH as usize)),
        };
        assert!(too_long.validate().is_err());
    }
}
