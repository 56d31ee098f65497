//! Pipeline and model configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use clipsum_analysis::ollama::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_REASONING_MODEL, DEFAULT_VISION_MODEL};
use clipsum_analysis::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use clipsum_analysis::{DEFAULT_MAX_NEW_TOKENS, DEFAULT_VISION_PROMPT};
use clipsum_media::{
    resolve::DEFAULT_FORMAT, CaptureBackend, YtDlpOptions, DEFAULT_FRAMES_DIR,
    DEFAULT_MAX_CLIP_DURATION,
};
use clipsum_models::SampleOffsets;

use crate::error::{PipelineError, PipelineResult};

/// Clip acquisition and analysis settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory captured frames are written to
    pub frames_dir: PathBuf,
    /// Relative sampling points
    pub offsets: SampleOffsets,
    /// Longest clip accepted, in seconds
    pub max_clip_duration: f64,
    /// Stream resolution options
    pub ytdlp: YtDlpOptions,
    /// Frame capture backend
    pub capture_backend: CaptureBackend,
    /// Upper bound for opening the stream and for each frame grab
    pub capture_timeout: Duration,
    /// Prompt sent with every frame
    pub vision_prompt: String,
    /// Token budget for the summary
    pub summary_max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from(DEFAULT_FRAMES_DIR),
            offsets: SampleOffsets::default(),
            max_clip_duration: DEFAULT_MAX_CLIP_DURATION,
            ytdlp: YtDlpOptions::default(),
            capture_backend: CaptureBackend::default(),
            capture_timeout: Duration::from_secs(30),
            vision_prompt: DEFAULT_VISION_PROMPT.to_string(),
            summary_max_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let offsets = match std::env::var("CLIPSUM_FRAME_OFFSETS") {
            Ok(raw) => SampleOffsets::parse_list(&raw)
                .map_err(|e| PipelineError::config(format!("CLIPSUM_FRAME_OFFSETS: {}", e)))?,
            Err(_) => SampleOffsets::default(),
        };

        let max_clip_duration: f64 = env_parse("CLIPSUM_MAX_CLIP_DURATION", DEFAULT_MAX_CLIP_DURATION);
        if !(max_clip_duration.is_finite() && max_clip_duration > 0.0) {
            return Err(PipelineError::config(
                "CLIPSUM_MAX_CLIP_DURATION must be a positive number",
            ));
        }

        let capture_backend = match std::env::var("CLIPSUM_CAPTURE_BACKEND") {
            Ok(raw) => raw.parse().map_err(PipelineError::config)?,
            Err(_) => CaptureBackend::default(),
        };

        let ytdlp = YtDlpOptions {
            quiet: env_bool("CLIPSUM_YTDLP_QUIET", true),
            no_playlist: env_bool("CLIPSUM_YTDLP_NO_PLAYLIST", true),
            skip_certificate_check: env_bool("CLIPSUM_YTDLP_SKIP_CERT_CHECK", false),
            format: std::env::var("CLIPSUM_YTDLP_FORMAT").unwrap_or_else(|_| DEFAULT_FORMAT.to_string()),
            cookies_path: std::env::var("CLIPSUM_YTDLP_COOKIES").ok().map(PathBuf::from),
            timeout_secs: env_parse("CLIPSUM_RESOLVE_TIMEOUT_SECS", 60),
        };

        if ytdlp.skip_certificate_check {
            warn!("CLIPSUM_YTDLP_SKIP_CERT_CHECK is enabled: TLS certificates will not be verified during stream resolution");
        }

        Ok(Self {
            frames_dir: std::env::var("CLIPSUM_FRAMES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_FRAMES_DIR)),
            offsets,
            max_clip_duration,
            ytdlp,
            capture_backend,
            capture_timeout: Duration::from_secs(env_parse("CLIPSUM_CAPTURE_TIMEOUT_SECS", 30)),
            vision_prompt: std::env::var("CLIPSUM_VISION_PROMPT")
                .unwrap_or_else(|_| DEFAULT_VISION_PROMPT.to_string()),
            summary_max_tokens: env_parse("CLIPSUM_SUMMARY_MAX_TOKENS", DEFAULT_MAX_NEW_TOKENS),
        })
    }
}

/// Which service hosts the models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelProvider {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Google Gemini API
    Gemini,
}

impl FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            other => Err(format!("unknown model provider '{}'", other)),
        }
    }
}

/// Model client settings.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub provider: ModelProvider,
    pub vision_model: String,
    pub reasoning_model: String,
    pub ollama_base_url: String,
    pub gemini_base_url: String,
    pub gemini_api_key: Option<String>,
    /// Upper bound for one model HTTP call
    pub timeout: Duration,
    /// Force the concurrency declaration of the models
    pub concurrent_override: Option<bool>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            reasoning_model: DEFAULT_REASONING_MODEL.to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_api_key: None,
            timeout: Duration::from_secs(120),
            concurrent_override: None,
        }
    }
}

impl ModelConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let provider = match std::env::var("CLIPSUM_MODEL_PROVIDER") {
            Ok(raw) => raw.parse().map_err(PipelineError::config)?,
            Err(_) => ModelProvider::default(),
        };

        let (default_vision, default_reasoning) = match provider {
            ModelProvider::Ollama => (DEFAULT_VISION_MODEL, DEFAULT_REASONING_MODEL),
            ModelProvider::Gemini => (DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_MODEL),
        };

        Ok(Self {
            provider,
            vision_model: std::env::var("CLIPSUM_VISION_MODEL")
                .unwrap_or_else(|_| default_vision.to_string()),
            reasoning_model: std::env::var("CLIPSUM_REASONING_MODEL")
                .unwrap_or_else(|_| default_reasoning.to_string()),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string()),
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(env_parse("CLIPSUM_MODEL_TIMEOUT_SECS", 120)),
            concurrent_override: std::env::var("CLIPSUM_MODEL_CONCURRENT")
                .ok()
                .and_then(|v| parse_bool(&v)),
        })
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
