use axum::{
    body::{Body, to_bytes},
    http::{Request, header::CONTENT_LENGTH},
    response::Response,
    middleware::Next,
};
use tracing::error;

// 错误响应体都很短，超出部分不记录
const MAX_LOGGED_BODY: usize = 2048;

/// 记录所有 5xx 响应，响应体原样返回
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(b) => b,
        Err(e) => {
            error!(
                "{} {} failed with {}; body unreadable: {}",
                method, path, parts.status, e
            );
            parts.headers.remove(CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        "{} {} failed with {}: {}",
        method,
        path,
        parts.status,
        String::from_utf8_lossy(&bytes)
    );

    Response::from_parts(parts, Body::from(bytes))
}
