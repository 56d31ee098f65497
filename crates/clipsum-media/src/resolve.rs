//! Stream resolution using yt-dlp.
//!
//! Turns a page URL (YouTube, Vimeo, a direct file link, ...) into stream
//! metadata and a media URL that FFmpeg or OpenCV can open directly. Nothing
//! is downloaded. A single attempt is made per call.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

use clipsum_models::StreamInfo;

use crate::command::{check_ytdlp, last_line, run_with_timeout};
use crate::error::{MediaError, MediaResult};

/// Default format selector: best single file that carries a video track.
pub const DEFAULT_FORMAT: &str = "best[vcodec!=none]/best";

/// Resolves a URL into playable stream metadata.
#[async_trait]
pub trait StreamResolve: Send + Sync {
    async fn resolve(&self, url: &str) -> MediaResult<StreamInfo>;
}

/// yt-dlp invocation options.
#[derive(Debug, Clone)]
pub struct YtDlpOptions {
    /// Suppress progress and warnings
    pub quiet: bool,
    /// Resolve only the referenced video when the URL also names a playlist
    pub no_playlist: bool,
    /// Skip TLS certificate validation (insecure, off by default)
    pub skip_certificate_check: bool,
    /// Format selector passed to `-f`
    pub format: String,
    /// Netscape cookies file for sites that require a session
    pub cookies_path: Option<PathBuf>,
    /// Upper bound for one resolution call
    pub timeout_secs: u64,
}

impl Default for YtDlpOptions {
    fn default() -> Self {
        Self {
            quiet: true,
            no_playlist: true,
            skip_certificate_check: false,
            format: DEFAULT_FORMAT.to_string(),
            cookies_path: None,
            timeout_secs: 60,
        }
    }
}

/// [`StreamResolve`] backed by the yt-dlp CLI.
#[derive(Debug, Clone, Default)]
pub struct YtDlpResolver {
    options: YtDlpOptions,
}

impl YtDlpResolver {
    pub fn new(options: YtDlpOptions) -> Self {
        if options.skip_certificate_check {
            warn!("yt-dlp certificate validation is disabled");
        }
        Self { options }
    }

    pub fn options(&self) -> &YtDlpOptions {
        &self.options
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-download".to_string(),
            "-f".to_string(),
            self.options.format.clone(),
        ];

        if self.options.quiet {
            args.push("--quiet".to_string());
            args.push("--no-warnings".to_string());
        }
        if self.options.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if self.options.skip_certificate_check {
            args.push("--no-check-certificates".to_string());
        }
        if let Some(ref cookies) = self.options.cookies_path {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().to_string());
        }

        // End of options: the URL can never be read as a flag.
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl StreamResolve for YtDlpResolver {
    async fn resolve(&self, url: &str) -> MediaResult<StreamInfo> {
        check_ytdlp().map_err(|e| MediaError::stream_resolution(e.to_string()))?;

        let args = self.build_args(url);
        debug!("Running yt-dlp: yt-dlp {}", args.join(" "));

        let mut command = Command::new("yt-dlp");
        command.args(&args);

        let output = run_with_timeout(&mut command, Some(self.options.timeout_secs))
            .await
            .map_err(|e| MediaError::stream_resolution(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(MediaError::stream_resolution(
                last_line(&stderr).unwrap_or("yt-dlp exited with non-zero status"),
            ));
        }

        let info = parse_metadata(&output.stdout)?;

        info!(
            clip_id = %info.id,
            duration = info.duration_seconds,
            "Resolved stream"
        );

        Ok(info)
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    duration: Option<f64>,
    url: Option<String>,
    #[serde(default)]
    requested_formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    url: Option<String>,
    vcodec: Option<String>,
}

/// Extract [`StreamInfo`] from yt-dlp's JSON dump.
pub fn parse_metadata(stdout: &[u8]) -> MediaResult<StreamInfo> {
    let raw: YtDlpInfo = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::stream_resolution(format!("Unreadable metadata: {}", e)))?;

    // Merged formats have no top-level url; take the video half.
    let media_url = raw
        .url
        .filter(|u| !u.is_empty())
        .or_else(|| {
            raw.requested_formats
                .into_iter()
                .filter(|f| f.vcodec.as_deref().is_some_and(|c| c != "none"))
                .find_map(|f| f.url.filter(|u| !u.is_empty()))
        })
        .ok_or_else(|| MediaError::stream_resolution("Metadata has no playable media URL"))?;

    let duration_seconds = match raw.duration {
        Some(d) if d.is_finite() && d > 0.0 => d,
        Some(d) => {
            return Err(MediaError::stream_resolution(format!(
                "Invalid clip duration: {}",
                d
            )))
        }
        None => {
            return Err(MediaError::stream_resolution(
                "Metadata has no duration (live streams are not supported)",
            ))
        }
    };

    Ok(StreamInfo {
        id: raw
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        duration_seconds,
        media_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata() {
        let json = br#"{"id": "abc123", "duration": 12.0, "url": "https://cdn.example.com/abc.mp4"}"#;
        let info = parse_metadata(json).unwrap();
        assert_eq!(info.id, "abc123");
        assert_eq!(info.duration_seconds, 12.0);
        assert_eq!(info.media_url, "https://cdn.example.com/abc.mp4");
    }

    #[test]
    fn test_parse_metadata_merged_formats() {
        let json = br#"{
            "id": "abc123",
            "duration": 20,
            "requested_formats": [
                {"url": "https://cdn.example.com/audio", "vcodec": "none"},
                {"url": "https://cdn.example.com/video", "vcodec": "avc1"}
            ]
        }"#;
        let info = parse_metadata(json).unwrap();
        assert_eq!(info.media_url, "https://cdn.example.com/video");
    }

    #[test]
    fn test_parse_metadata_missing_id_defaults() {
        let json = br#"{"duration": 5.5, "url": "https://cdn.example.com/x.mp4"}"#;
        assert_eq!(parse_metadata(json).unwrap().id, "unknown");
    }

    #[test]
    fn test_parse_metadata_rejects_unusable() {
        let no_url = br#"{"id": "a", "duration": 5.0}"#;
        let no_duration = br#"{"id": "a", "url": "https://x/y.mp4"}"#;
        let zero_duration = br#"{"id": "a", "duration": 0, "url": "https://x/y.mp4"}"#;

        for json in [&no_url[..], &no_duration[..], &zero_duration[..], b"not json"] {
            assert!(matches!(
                parse_metadata(json),
                Err(MediaError::StreamResolution { .. })
            ));
        }
    }

    #[test]
    fn test_build_args() {
        let resolver = YtDlpResolver::new(YtDlpOptions::default());
        let args = resolver.build_args("https://youtu.be/abc123");
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--quiet".to_string()));
        assert!(!args.contains(&"--no-check-certificates".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc123"));

        let insecure = YtDlpResolver::new(YtDlpOptions {
            skip_certificate_check: true,
            quiet: false,
            ..Default::default()
        });
        let args = insecure.build_args("https://youtu.be/abc123");
        assert!(args.contains(&"--no-check-certificates".to_string()));
        assert!(!args.contains(&"--quiet".to_string()));
    }
}
