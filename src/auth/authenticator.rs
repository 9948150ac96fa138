use std::sync::Arc;

use super::{AuthError, authorize};
use crate::config::IdentifierKind;
use crate::database::{Account, CredentialStore, NewAccount};
use crate::utils::{AccessToken, Claims, TokenKeys, hash_password, verify_password};

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    tokens: TokenKeys,
    bcrypt_cost: u32,
    identifier_kind: IdentifierKind,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenKeys,
        bcrypt_cost: u32,
        identifier_kind: IdentifierKind,
    ) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
            identifier_kind,
        }
    }

    pub async fn register(
        &self,
        identifier: &str,
        secret: &str,
        display_name: Option<String>,
    ) -> Result<Account, AuthError> {
        validate_identifier(self.identifier_kind, identifier)?;
        if secret.is_empty() {
            return Err(AuthError::InvalidInput("Secret is required".to_string()));
        }

        let secret_hash = self.hash(secret).await?;
        let display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let account = self
            .store
            .create(NewAccount {
                identifier: identifier.to_string(),
                secret_hash,
                display_name,
            })
            .await?;

        tracing::info!("Registered account: {}", account.identifier);
        Ok(account)
    }

    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<(AccessToken, Account), AuthError> {
        if identifier.trim().is_empty() || secret.is_empty() {
            return Err(AuthError::InvalidInput(
                "Identifier and secret are required".to_string(),
            ));
        }

        let account = self
            .store
            .find(identifier)
            .await?
            .ok_or_else(|| AuthError::NotFound(identifier.to_string()))?;

        if !self.verify(secret, &account.secret_hash).await? {
            return Err(AuthError::BadSecret(identifier.to_string()));
        }

        let token = self
            .tokens
            .issue(&account.identifier)
            .map_err(AuthError::Signing)?;

        tracing::info!("Login succeeded: {}", account.identifier);
        Ok((token, account))
    }

    pub fn authorize(&self, token: Option<&str>) -> Result<Claims, AuthError> {
        authorize(&self.tokens, token)
    }

    // bcrypt 是 CPU 密集型，放到阻塞线程池
    async fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let secret = secret.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&secret, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    async fn verify(&self, secret: &str, secret_hash: &str) -> Result<bool, AuthError> {
        let secret = secret.to_string();
        let secret_hash = secret_hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&secret, &secret_hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

fn validate_identifier(kind: IdentifierKind, identifier: &str) -> Result<(), AuthError> {
    if identifier.trim().is_empty() {
        return Err(AuthError::InvalidInput("Identifier is required".to_string()));
    }

    match kind {
        IdentifierKind::Email => {
            if !identifier.contains('@') || !identifier.contains('.') {
                return Err(AuthError::InvalidInput("Invalid email format".to_string()));
            }
        }
        IdentifierKind::Username => {
            if !identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(AuthError::InvalidInput(
                    "Username may only contain letters, digits and underscores".to_string(),
                ));
            }
        }
    }

    Ok(())
}
