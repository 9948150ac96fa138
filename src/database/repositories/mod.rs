// 凭据存储接口及其实现

mod account;
mod memory;

use async_trait::async_trait;

use super::models::account::{Account, NewAccount};

pub use account::PgCredentialStore;
pub use memory::MemoryCredentialStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("identifier already registered: {0}")]
    DuplicateIdentifier(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// 以标识符为键的账户存储。
///
/// 唯一性必须由存储层原子地保证：同一标识符的并发 `create` 只有一个成功，
/// 其余返回 [`StoreError::DuplicateIdentifier`]。
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn find(&self, identifier: &str) -> Result<Option<Account>, StoreError>;
}
