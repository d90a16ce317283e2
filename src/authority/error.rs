//! HTTP 错误响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::core::{UpstreamError, ValidationError};
use crate::engine::NETWORK_FAILURE_STATUS;
use crate::protocol::ErrorBody;

#[derive(Debug)]
pub enum ApiError {
    /// 请求不合法 → 400
    Validation(ValidationError),
    /// 资源不存在（如没有凭证）→ 404
    NotFound(String),
    /// 需要登录 → 401
    Unauthorized(String),
    /// 媒体服务调用失败 → 透传状态码，拿不到响应时 502
    Upstream(UpstreamError),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Bad request".to_string(),
                    details: Some(e.to_string()),
                },
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: msg,
                    details: None,
                },
            ),
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: msg,
                    details: None,
                },
            ),
            ApiError::Upstream(UpstreamError::Status { status, body }) => (
                upstream_status(status),
                ErrorBody {
                    error: "Provider API error".to_string(),
                    details: Some(body),
                },
            ),
            ApiError::Upstream(other) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error: "Provider API error".to_string(),
                    details: Some(other.to_string()),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

fn upstream_status(status: u16) -> StatusCode {
    if status == NETWORK_FAILURE_STATUS {
        return StatusCode::BAD_GATEWAY;
    }
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}
