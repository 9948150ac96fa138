use axum::Json;
use serde::Serialize;

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// 服务器时间
    pub timestamp: i64,
}

pub async fn home() -> &'static str {
    "Backend is running"
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().timestamp(),
    })
}
