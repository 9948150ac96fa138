use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;
use serde_json::json;

use crate::config::Config;

/// 按客户端 IP 的固定窗口限流，计数存放在 Redis
#[derive(Clone)]
pub struct RateLimiter {
    redis: redis::Client,
    max_requests: u32,
    window: Duration,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(redis: redis::Client, config: &Config) -> Self {
        Self {
            redis,
            max_requests: config.rate_limit_requests,
            window: config.rate_limit_window(),
            trust_proxy_headers: config.trust_proxy_headers,
        }
    }

    async fn hit(&self, ip: &str) -> redis::RedisResult<u32> {
        let key = format!("rate_limit:{}", ip);
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        // INCR + EXPIRE 实现计数器
        let count: u32 = conn.incr(&key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(&key, self.window.as_secs() as i64).await?;
        }
        Ok(count)
    }

    /// 超出窗口内的配额时返回 429 响应
    fn rejection(&self, count: u32) -> Option<Response> {
        if count <= self.max_requests {
            return None;
        }

        Some(
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": format!(
                        "Too many requests, retry in {} seconds",
                        self.window.as_secs()
                    )
                })),
            )
                .into_response(),
        )
    }
}

fn client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    // 代理头可被客户端伪造，只在部署于反向代理之后时采用
    let forwarded = trust_proxy_headers
        .then(|| {
            req.headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .or_else(|| {
                    req.headers()
                        .get("x-forwarded-for")
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
                })
        })
        .flatten();

    forwarded
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req, limiter.trust_proxy_headers);

    match limiter.hit(&ip).await {
        Ok(count) => match limiter.rejection(count) {
            Some(response) => {
                tracing::warn!("Rate limit exceeded for {}", ip);
                response
            }
            None => next.run(req).await,
        },
        Err(e) => {
            // Redis 不可用时放行
            tracing::warn!("Rate limiter unavailable, letting request through: {}", e);
            next.run(req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::to_bytes, routing::get};
    use tower::ServiceExt;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn limiter(redis_url: &str, trust_proxy_headers: bool) -> RateLimiter {
        let config = Config {
            rate_limit_requests: 2,
            trust_proxy_headers,
            ..Config::default()
        };
        RateLimiter::new(redis::Client::open(redis_url).unwrap(), &config)
    }

    #[test]
    fn real_ip_header_wins_behind_proxy() {
        let req = request(&[("x-real-ip", "10.0.0.1"), ("x-forwarded-for", "10.0.0.2")]);
        assert_eq!(client_ip(&req, true), "10.0.0.1");
    }

    #[test]
    fn first_forwarded_address_is_used_behind_proxy() {
        let req = request(&[("x-forwarded-for", "10.0.0.2, 10.0.0.3")]);
        assert_eq!(client_ip(&req, true), "10.0.0.2");
    }

    #[test]
    fn proxy_headers_are_ignored_by_default() {
        let mut req = request(&[("x-real-ip", "10.0.0.1"), ("x-forwarded-for", "10.0.0.2")]);
        assert_eq!(client_ip(&req, false), "unknown");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_ip(&req, false), "127.0.0.1");
    }

    #[test]
    fn connection_address_is_the_fallback() {
        let mut req = request(&[]);
        assert_eq!(client_ip(&req, true), "unknown");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_ip(&req, true), "127.0.0.1");
    }

    #[tokio::test]
    async fn requests_over_the_limit_get_429() {
        let limiter = limiter("redis://127.0.0.1:6379", false);
        assert!(limiter.rejection(1).is_none());
        assert!(limiter.rejection(2).is_none());

        let response = limiter.rejection(3).unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Too many requests, retry in 60 seconds");
    }

    #[tokio::test]
    async fn unreachable_redis_lets_requests_through() {
        let limiter = Arc::new(limiter("redis://127.0.0.1:1", false));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limiter, rate_limit));

        let response = app.oneshot(request(&[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
