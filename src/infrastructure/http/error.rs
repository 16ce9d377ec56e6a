//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{ApplicationError, NarrationError};

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl ApiError {
    fn parts(&self) -> (i32, &str) {
        match self {
            ApiError::BadRequest(msg) => (errno::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (errno::CONFLICT, msg),
            ApiError::Internal(msg) => (errno::INTERNAL_ERROR, msg),
            ApiError::ServiceUnavailable(msg) => (errno::SERVICE_UNAVAILABLE, msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, msg) = self.parts();
        match &self {
            ApiError::BadRequest(_) => {
                tracing::warn!(errno = code, error = %msg, "Bad request")
            }
            ApiError::Conflict(_) => {
                tracing::warn!(errno = code, error = %msg, "Conflicting narration state")
            }
            ApiError::Internal(_) => {
                tracing::error!(errno = code, error = %msg, "Internal server error")
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::error!(errno = code, error = %msg, "Service unavailable")
            }
        }

        // 业务错误统一返回 200，由 errno 区分
        (StatusCode::OK, Json(ErrorResponse::new(code, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::InvalidState(msg) => ApiError::Conflict(msg),
            ApplicationError::Narration(e) => e.into(),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<NarrationError> for ApiError {
    fn from(e: NarrationError) -> Self {
        match e {
            NarrationError::EmptySession => ApiError::BadRequest(e.to_string()),
            NarrationError::PlaybackDeviceFailure(_) => ApiError::ServiceUnavailable(e.to_string()),
            NarrationError::RemoteSynthesisFailure(_) | NarrationError::LocalSynthesisFailure(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PlaybackError;

    #[test]
    fn test_application_error_mapping() {
        let err: ApiError = ApplicationError::validation("empty text").into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = ApplicationError::invalid_state("busy").into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_device_failure_is_unavailable() {
        let err: ApiError = ApplicationError::from(NarrationError::PlaybackDeviceFailure(
            PlaybackError::DeviceUnavailable("no sound card".into()),
        ))
        .into();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
        assert_eq!(err.parts().0, errno::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_response_status_is_ok() {
        let response = ApiError::BadRequest("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
