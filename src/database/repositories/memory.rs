use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{CredentialStore, StoreError};
use crate::database::models::account::{Account, NewAccount};

/// 内存账户存储，用于测试和本地开发（STORAGE=memory）
#[derive(Default)]
pub struct MemoryCredentialStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.lock().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        // 检查与插入在同一把锁内完成
        let mut accounts = self.accounts.lock().await;
        match accounts.entry(account.identifier.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateIdentifier(account.identifier)),
            Entry::Vacant(slot) => {
                let created = account.into_account(Utc::now());
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn find(&self, identifier: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.lock().await.get(identifier).cloned())
    }
}
