use axum::{
    extract::{Extension, Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{AppState, error::AppError, utils::Claims};

use super::model::{
    LoginRequest, LoginResponse, ProtectedResponse, RegisterRequest, RegisterResponse,
};

// 请求体格式错误统一按 400 处理
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::InvalidInput(e.body_text()))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = json_body(payload)?;
    let identifier = req.identifier.unwrap_or_default();
    let secret = req.secret.unwrap_or_default();

    let account = state
        .authenticator
        .register(&identifier, &secret, req.display_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful",
            user: account,
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let req = json_body(payload)?;
    let identifier = req.identifier.unwrap_or_default();
    let secret = req.secret.unwrap_or_default();

    let (token, account) = state.authenticator.login(&identifier, &secret).await?;

    Ok(Json(LoginResponse {
        access_token: token.token,
        token_type: "Bearer",
        expires_at: token.expires_at,
        user: account,
    }))
}

/// 认证中间件已校验令牌，这里直接读取身份
#[axum::debug_handler]
pub async fn protected(Extension(claims): Extension<Claims>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: format!("Hello, {}! You have access.", claims.sub),
    })
}
