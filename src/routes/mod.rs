pub mod health;
pub mod predict;
pub mod user;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    AppState,
    config::Config,
    middleware::{auth_middleware, log_errors},
};

/// 组装全部路由（不含 CORS 与限流，由调用方按部署环境添加）
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health::home))
        .route("/health", get(health::health))
        .route("/register", post(user::register))
        .route("/login", post(user::login))
        .route(
            "/predict",
            post(predict::predict).layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        );

    let protected_routes = Router::new()
        .route("/protected", get(user::protected))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}

/// 调试构建放开所有来源，发布构建只允许配置的来源
pub fn cors_layer(config: &Config) -> CorsLayer {
    if cfg!(debug_assertions) {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
