use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::scoring::ImageScoreError;

/// 登录失败统一提示，不区分账户是否存在
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid identifier or secret";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("dependency failure: {0}")]
    Dependency(String),
    #[error("timed out: {0}")]
    Timeout(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Dependency(detail) => {
                // 细节只写日志，不返回给调用方
                tracing::error!("Dependency failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Timeout(detail) => {
                tracing::error!("Request timed out: {}", detail);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Prediction timed out, please retry later".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(msg) => AppError::InvalidInput(msg),
            AuthError::DuplicateIdentifier(_) => {
                AppError::Conflict("Identifier already registered".to_string())
            }
            AuthError::NotFound(ref id) => {
                tracing::warn!("Login failed, unknown identifier: {}", id);
                AppError::Unauthorized(LOGIN_FAILED_MESSAGE)
            }
            AuthError::BadSecret(ref id) => {
                tracing::warn!("Login failed, wrong secret for: {}", id);
                AppError::Unauthorized(LOGIN_FAILED_MESSAGE)
            }
            AuthError::MissingToken => AppError::Unauthorized("Missing access token"),
            AuthError::InvalidToken => AppError::Unauthorized("Invalid access token"),
            AuthError::ExpiredToken => AppError::Unauthorized("Access token expired"),
            AuthError::Store(_) | AuthError::Hashing(_) | AuthError::Signing(_) => {
                AppError::Dependency(err.to_string())
            }
        }
    }
}

impl From<ImageScoreError> for AppError {
    fn from(err: ImageScoreError) -> Self {
        match err {
            ImageScoreError::UnreadableImage(_) => AppError::InvalidInput(
                "Image could not be read. Please upload a valid PNG or JPG image".to_string(),
            ),
            ImageScoreError::UnsupportedFormat(_) => AppError::InvalidInput(
                "Invalid file format. Please upload a PNG or JPG image".to_string(),
            ),
            ImageScoreError::ClassifierUnavailable(_) => AppError::Dependency(err.to_string()),
            ImageScoreError::Timeout(_) => AppError::Timeout(err.to_string()),
        }
    }
}
