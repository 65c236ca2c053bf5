use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

pub const USERNAME_MAX_LEN: usize = 150;

/// Letters, digits and `_ . @ + -`, so a username is always a single path segment.
fn is_username(value: &str) -> bool {
    !value.is_empty()
        && value.chars().count() <= USERNAME_MAX_LEN
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username", "must not be empty"));
        }
        if !is_username(username) {
            return Err(DomainError::validation(
                "username",
                "only letters, digits and @/./+/-/_ are allowed",
            ));
        }
        if password.is_empty() {
            return Err(DomainError::validation("password", "must not be empty"));
        }
        let hash =
            hash_password(password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username.to_string(), email.trim().to_lowercase(), hash);
        self.repo.create(user).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, DomainError> {
        let user = self
            .repo
            .find_by_username(username.trim())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        self.keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Removes the account and everything it owns.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, username: &str) -> Result<(), DomainError> {
        let user = self.get_by_username(username).await?;
        self.repo.delete(user.id).await?;
        Ok(())
    }
}
