use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, auth::AuthError, error::AppError};

/// 校验 Bearer 令牌，并把 Claims 放入请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let claims = state.authenticator.authorize(token.as_deref())?;

    tracing::debug!("Authorized request for {}", claims.sub);
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// 没有 Authorization 头为缺失，有但不是 Bearer 格式为无效
fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    if !headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    match headers.typed_try_get::<Authorization<Bearer>>() {
        Ok(Some(auth)) => Ok(Some(auth.token().to_string())),
        _ => Err(AuthError::InvalidToken),
    }
}
