//! 注册、登录与访问令牌校验

mod authenticator;

pub use authenticator::Authenticator;

use jsonwebtoken::errors::ErrorKind;

use crate::database::StoreError;
use crate::utils::{Claims, TokenError, TokenKeys};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("identifier already registered: {0}")]
    DuplicateIdentifier(String),
    #[error("no account for identifier {0}")]
    NotFound(String),
    #[error("wrong secret for identifier {0}")]
    BadSecret(String),
    #[error("missing access token")]
    MissingToken,
    #[error("invalid access token")]
    InvalidToken,
    #[error("access token expired")]
    ExpiredToken,
    #[error("credential store failure: {0}")]
    Store(sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(TokenError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdentifier(id) => AuthError::DuplicateIdentifier(id),
            StoreError::Database(e) => AuthError::Store(e),
        }
    }
}

/// 校验令牌并返回其中的身份信息
pub fn authorize(keys: &TokenKeys, token: Option<&str>) -> Result<Claims, AuthError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    keys.verify(token).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })
}
