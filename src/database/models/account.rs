use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// 账户数据库实体
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub identifier: String,
    #[serde(skip_serializing)]
    pub secret_hash: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 待写入的账户，密码已经过哈希
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub identifier: String,
    pub secret_hash: String,
    pub display_name: Option<String>,
}

impl NewAccount {
    pub(crate) fn into_account(self, created_at: DateTime<Utc>) -> Account {
        Account {
            identifier: self.identifier,
            secret_hash: self.secret_hash,
            display_name: self.display_name,
            created_at,
        }
    }
}
