//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use clipsum_media::{check_ffmpeg, check_ffprobe, check_ytdlp, CaptureBackend, MediaResult};

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Liveness endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub ytdlp: CheckStatus,
    pub ffmpeg: CheckStatus,
    pub ffprobe: CheckStatus,
    pub frames_dir: CheckStatus,
}

impl ReadinessChecks {
    fn all_ok(&self) -> bool {
        [&self.ytdlp, &self.ffmpeg, &self.ffprobe, &self.frames_dir]
            .iter()
            .all(|c| c.status != "error")
    }
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckStatus {
    fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
            detail: Some(detail.into()),
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
            detail: None,
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: "skipped".to_string(),
            error: None,
            detail: Some(reason.into()),
        }
    }

    fn from_binary(found: MediaResult<std::path::PathBuf>) -> Self {
        match found {
            Ok(path) => Self::ok(path.display().to_string()),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

/// Readiness endpoint.
/// Checks the external binaries the capture backend needs and that frames
/// can be written.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let store = state.pipeline.frame_store();
    let frames_dir = if store.is_writable().await {
        CheckStatus::ok(store.dir().display().to_string())
    } else {
        CheckStatus::error(format!("{} is not writable", store.dir().display()))
    };

    let (ffmpeg, ffprobe) = match state.capture_backend {
        CaptureBackend::Ffmpeg => (
            CheckStatus::from_binary(check_ffmpeg()),
            CheckStatus::from_binary(check_ffprobe()),
        ),
        CaptureBackend::OpenCv => (
            CheckStatus::skipped("not used by the opencv backend"),
            CheckStatus::skipped("not used by the opencv backend"),
        ),
    };

    let checks = ReadinessChecks {
        ytdlp: CheckStatus::from_binary(check_ytdlp()),
        ffmpeg,
        ffprobe,
        frames_dir,
    };

    let all_ok = checks.all_ok();
    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks,
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
