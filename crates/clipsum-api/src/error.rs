//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use clipsum_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Processing did not finish within {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Pipeline(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Pipeline messages name the durations and frame paths the caller needs.
        let detail = self.to_string();

        let code = match &self {
            ApiError::Pipeline(e) => Some(e.kind()),
            ApiError::Timeout(_) => Some("timeout"),
            _ => None,
        };

        (status, Json(ErrorResponse { detail, code })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsum_analysis::{AnalysisError, FrameFailure};
    use clipsum_media::MediaError;

    #[test]
    fn test_status_mapping() {
        let too_long: ApiError = PipelineError::from(MediaError::clip_too_long(45.0, 30.0)).into();
        assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);
        assert!(too_long.to_string().starts_with("The clip to be analyzed is too long"));

        let stream: ApiError = PipelineError::from(MediaError::video_stream("refused")).into();
        assert_eq!(stream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let frame: ApiError = PipelineError::from(AnalysisError::frame(
            "static/frames/abc123_50.jpg",
            FrameFailure::Missing,
        ))
        .into();
        assert_eq!(frame.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(frame.to_string().contains("static/frames/abc123_50.jpg"));

        assert_eq!(ApiError::Timeout(600).status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::validation("url: length").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_response_body_carries_message() {
        let err: ApiError = PipelineError::from(MediaError::video_stream("refused")).into();
        let message = err.to_string();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], message);
        assert_eq!(body["code"], "video_stream");

        let response = ApiError::bad_request("missing url").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Bad request: missing url");
        assert!(body.get("code").is_none());
    }
}
