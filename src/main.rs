use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;

use backend::{
    AppState,
    config::{Config, StorageBackend},
    database::{CredentialStore, MemoryCredentialStore, PgCredentialStore},
    middleware::{RateLimiter, rate_limit},
    routes,
    scoring::{Classifier, LinearClassifier, ensure_model},
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置
    let config = Config::from_env()?;

    // 模型不可用时不提供服务
    ensure_model(
        &config.model_path,
        config.model_url.as_deref(),
        config.model_sha256.as_deref(),
    )
    .await?;
    let model = LinearClassifier::load(&config.model_path)?;
    tracing::info!(
        "Loaded model {} ({} weights)",
        model.model_name,
        model.weights.len()
    );
    let classifier: Arc<dyn Classifier> = Arc::new(model);

    let store: Arc<dyn CredentialStore> = match config.storage {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL is not set")?;
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        conn.execute("SET application_name = 'ct_screen_backend';")
                            .await?;
                        Ok(())
                    })
                })
                .connect(database_url)
                .await?;
            let store = PgCredentialStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory credential store, accounts are lost on restart");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let state = AppState::new(config, store, classifier);
    let config = Arc::clone(&state.config);

    let router = routes::router(state);

    // 配置了 Redis 才启用限流
    let router = match &config.redis_url {
        Some(url) => {
            let limiter = Arc::new(RateLimiter::new(redis::Client::open(url.as_str())?, &config));
            tracing::info!(
                "Rate limiting enabled: {} requests per {}s",
                config.rate_limit_requests,
                config.rate_limit_window_secs
            );
            router.layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        }
        None => router,
    };

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with permissive CORS");

    let app = router.layer(routes::cors_layer(&config));

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
