use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::scoring::{DEFAULT_IMAGE_WEIGHT, DEFAULT_THRESHOLD, RiskWeights};
use crate::utils::expiry_after;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// 账户标识的格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Email,
    Username,
}

impl FromStr for IdentifierKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(IdentifierKind::Email),
            "username" => Ok(IdentifierKind::Username),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub bcrypt_cost: u32,
    pub identifier_kind: IdentifierKind,
    pub server_host: String,
    pub server_port: u16,
    pub model_path: PathBuf,
    pub model_url: Option<String>,
    pub model_sha256: Option<String>,
    pub inference_timeout_ms: u64,
    pub max_concurrent_inferences: usize,
    pub max_upload_bytes: usize,
    pub risk_image_weight: f64,
    pub risk_threshold: f64,
    pub cors_origins: Vec<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub trust_proxy_headers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageBackend::Postgres,
            database_url: None,
            redis_url: None,
            jwt_secret: String::new(),
            jwt_expiration_secs: 24 * 3600,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            identifier_kind: IdentifierKind::Email,
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            model_path: PathBuf::from("final_model.json"),
            model_url: None,
            model_sha256: None,
            inference_timeout_ms: 10_000,
            max_concurrent_inferences: default_parallelism(),
            max_upload_bytes: 10 * 1024 * 1024,
            risk_image_weight: DEFAULT_IMAGE_WEIGHT,
            risk_threshold: DEFAULT_THRESHOLD,
            cors_origins: vec!["http://localhost:5173".to_string()],
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            trust_proxy_headers: false,
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构建配置，空白值视为未设置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let storage = match get("STORAGE").as_deref().map(str::trim) {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE",
                    value: other.to_string(),
                });
            }
        };

        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration_secs = match get("JWT_EXPIRATION") {
            Some(raw) => {
                let hours = parse_value::<u64>("JWT_EXPIRATION", raw.trim_end_matches('h'))?;
                // 签发时的过期时间必须能用 DateTime 表示
                hours
                    .checked_mul(3600)
                    .filter(|secs| {
                        expiry_after(chrono::Utc::now(), Duration::from_secs(*secs)).is_some()
                    })
                    .ok_or(ConfigError::Invalid {
                        key: "JWT_EXPIRATION",
                        value: raw.clone(),
                    })?
            }
            None => defaults.jwt_expiration_secs,
        };

        let identifier_kind = match get("IDENTIFIER_KIND") {
            Some(raw) => raw.parse::<IdentifierKind>().map_err(|_| ConfigError::Invalid {
                key: "IDENTIFIER_KIND",
                value: raw.clone(),
            })?,
            None => defaults.identifier_kind,
        };

        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let max_concurrent_inferences = parse_or(
            "MAX_CONCURRENT_INFERENCES",
            get("MAX_CONCURRENT_INFERENCES"),
            defaults.max_concurrent_inferences,
        )?
        .max(1);

        let cors_origins = match get("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.cors_origins,
        };

        Ok(Config {
            storage,
            database_url,
            redis_url: get("REDIS_URL"),
            jwt_secret,
            jwt_expiration_secs,
            bcrypt_cost,
            identifier_kind,
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", get("SERVER_PORT"), defaults.server_port)?,
            model_path: get("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            model_url: get("MODEL_URL"),
            model_sha256: get("MODEL_SHA256").map(|s| s.trim().to_ascii_lowercase()),
            inference_timeout_ms: parse_positive(
                "INFERENCE_TIMEOUT_MS",
                get("INFERENCE_TIMEOUT_MS"),
                defaults.inference_timeout_ms,
            )?,
            max_concurrent_inferences,
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                defaults.max_upload_bytes,
            )?,
            risk_image_weight: parse_or(
                "RISK_IMAGE_WEIGHT",
                get("RISK_IMAGE_WEIGHT"),
                defaults.risk_image_weight,
            )?,
            risk_threshold: parse_or(
                "RISK_THRESHOLD",
                get("RISK_THRESHOLD"),
                defaults.risk_threshold,
            )?,
            cors_origins,
            rate_limit_window_secs: parse_positive(
                "RATE_LIMIT_WINDOW",
                get("RATE_LIMIT_WINDOW"),
                defaults.rate_limit_window_secs,
            )?,
            rate_limit_requests: parse_or(
                "RATE_LIMIT_REQUESTS",
                get("RATE_LIMIT_REQUESTS"),
                defaults.rate_limit_requests,
            )?,
            trust_proxy_headers: parse_or(
                "TRUST_PROXY_HEADERS",
                get("TRUST_PROXY_HEADERS"),
                defaults.trust_proxy_headers,
            )?,
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn risk_weights(&self) -> RiskWeights {
        RiskWeights {
            image_weight: self.risk_image_weight,
            threshold: self.risk_threshold,
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

// 为 0 时超时立即触发，限流窗口立即过期
fn parse_positive(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match parse_or(key, raw, default)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}
