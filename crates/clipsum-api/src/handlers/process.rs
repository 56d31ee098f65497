//! Clip processing handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{info, warn};
use validator::Validate;

use clipsum_models::{ClipRequest, ClipResult};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_process_timeout;
use crate::security::validate_clip_url;
use crate::state::AppState;

/// Summarize the clip at `url`.
///
/// Runs the whole pipeline inside the request and answers with the frame
/// descriptions and the summary. The request is abandoned once
/// `request_timeout` elapses; the pipeline future is dropped, which kills
/// any child process and releases the capture session.
pub async fn process_clip(
    State(state): State<AppState>,
    payload: Result<Json<ClipRequest>, JsonRejection>,
) -> ApiResult<Json<ClipResult>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let url = validate_clip_url(&request.url)
        .into_result()
        .map_err(ApiError::validation)?;
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let timeout = state.config.request_timeout;
    let result = tokio::time::timeout(timeout, state.pipeline.process(&url))
        .await
        .map_err(|_| {
            warn!(url = %url, timeout_secs = timeout.as_secs(), "Clip processing timed out");
            record_process_timeout();
            ApiError::Timeout(timeout.as_secs())
        })??;

    info!(
        clip_id = %result.clip_id,
        frames = result.frames.len(),
        "Clip processed"
    );

    Ok(Json(result))
}
