use async_trait::async_trait;
use sqlx::PgPool;

use super::{CredentialStore, StoreError};
use crate::database::models::account::{Account, NewAccount};

/// 基于 Postgres 的账户存储
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建表（已存在则跳过，不会清除数据）
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                identifier TEXT PRIMARY KEY,
                secret_hash TEXT NOT NULL,
                display_name TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let result = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (identifier, secret_hash, display_name)
            VALUES ($1, $2, $3)
            RETURNING identifier, secret_hash, display_name, created_at
            "#,
        )
        .bind(&account.identifier)
        .bind(&account.secret_hash)
        .bind(&account.display_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => {
                tracing::info!("Created account: {}", created.identifier);
                Ok(created)
            }
            // 主键冲突由数据库判定，不做先查后写
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateIdentifier(account.identifier))
            }
            Err(e) => {
                tracing::error!("Failed to create account: {:?}", e);
                Err(StoreError::Database(e))
            }
        }
    }

    async fn find(&self, identifier: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT identifier, secret_hash, display_name, created_at
            FROM accounts
            WHERE identifier = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }
}
