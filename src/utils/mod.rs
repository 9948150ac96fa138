use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 账户标识符
    pub exp: i64,    // 过期时间
    pub iat: i64,    // 签发时间
    pub jti: String, // 令牌ID
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token lifetime {0:?} is out of range")]
    LifetimeOutOfRange(std::time::Duration),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: i64,
}

/// HS256 签发与校验，无服务端会话
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: std::time::Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: std::time::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 过期即失效，不留宽限
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.jwt_expiration())
    }

    pub fn issue(&self, subject: &str) -> Result<AccessToken, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, TokenError> {
        let expires_at = expiry_after(issued_at, self.ttl)
            .ok_or(TokenError::LifetimeOutOfRange(self.ttl))?
            .timestamp();

        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at,
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        tracing::debug!("Issued token for {} expiring at {}", subject, expires_at);

        Ok(AccessToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// 超出 chrono 可表示范围时返回 `None`
pub fn expiry_after(issued_at: DateTime<Utc>, ttl: std::time::Duration) -> Option<DateTime<Utc>> {
    Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
}
