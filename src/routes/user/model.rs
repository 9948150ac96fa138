use serde::{Deserialize, Serialize};

use crate::database::Account;

/// 注册请求，兼容前端使用的 email/password/name 字段名
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default, alias = "email")]
    pub identifier: Option<String>,
    #[serde(default, alias = "password")]
    pub secret: Option<String>,
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: Account,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "email")]
    pub identifier: Option<String>,
    #[serde(default, alias = "password")]
    pub secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
    pub user: Account,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
}
