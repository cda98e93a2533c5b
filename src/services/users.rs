use std::sync::Arc;
use std::time::Duration;

use super::bounded;
use crate::auth::password::PasswordHasher;
use crate::auth::token::{token_ttl, TokenService};
use crate::error::DomainError;
use crate::models::{NewUser, User};
use crate::repository::UserRepository;

/// A successful login: the user and a freshly signed token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
    timeout: Duration,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
        timeout: Duration,
    ) -> Self {
        Self {
            repository,
            hasher,
            tokens,
            timeout,
        }
    }

    /// Creates a user. The very first user becomes admin.
    ///
    /// The existence check and the user count are separate reads; the gateway
    /// enforces uniqueness and guards the admin flag again on insert.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let exists = bounded(self.timeout, self.repository.username_exists(username)).await?;
        if exists {
            return Err(DomainError::UserAlreadyExists);
        }

        let password_hash = self.hash_password(password).await?;
        let count = bounded(self.timeout, self.repository.count()).await?;

        let user = bounded(
            self.timeout,
            self.repository.create(NewUser {
                username: username.to_string(),
                password_hash,
                is_admin: count == 0,
            }),
        )
        .await?;

        log::info!(
            "user {} registered (id {}, admin: {})",
            user.username,
            user.id,
            user.is_admin
        );
        Ok(user)
    }

    /// Checks the credentials and issues a 24 hour token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, DomainError> {
        let user = self.fetch_by_username(username).await?;

        if !self.verify_password(&user.password_hash, password).await? {
            log::warn!("failed login for user {}", username);
            return Err(DomainError::IncorrectPassword);
        }

        let token = self.tokens.issue(&user.id, &user.username, token_ttl())?;
        log::debug!("issued token for user {}", user.id);
        Ok(LoginOutcome { user, token })
    }

    pub async fn promote(&self, id: &str) -> Result<(), DomainError> {
        let matched = bounded(self.timeout, self.repository.promote(id)).await?;
        if matched == 0 {
            return Err(DomainError::UserNotFound);
        }
        log::info!("user {} promoted to admin", id);
        Ok(())
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<User, DomainError> {
        bounded(self.timeout, self.repository.fetch_by_id(id)).await
    }

    pub async fn fetch_by_username(&self, username: &str) -> Result<User, DomainError> {
        bounded(self.timeout, self.repository.fetch_by_username(username)).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<User>, DomainError> {
        bounded(self.timeout, self.repository.fetch_all()).await
    }

    async fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::PasswordHash(e.to_string()))?
            .map_err(|e| DomainError::PasswordHash(e.to_string()))
    }

    async fn verify_password(&self, hashed: &str, password: &str) -> Result<bool, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        let hashed = hashed.to_owned();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&hashed, &password))
            .await
            .map_err(|e| DomainError::PasswordHash(e.to_string()))?
            .map_err(|e| DomainError::PasswordHash(e.to_string()))
    }
}
