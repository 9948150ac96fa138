// 数据库模块
// 账户实体与凭据存储

pub mod models;
pub mod repositories;

pub use models::account::{Account, NewAccount};
pub use repositories::{CredentialStore, MemoryCredentialStore, PgCredentialStore, StoreError};
