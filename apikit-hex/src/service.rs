//! Credential Application Service
//!
//! Validates input and orchestrates the credential repository.
//! Contains NO infrastructure logic.

use apikit_types::{AppError, CredentialRepository, Username, domain::credential};

/// Application service for credential operations.
///
/// Generic over `R: CredentialRepository` - the adapter is injected at compile time.
pub struct CredentialService<R: CredentialRepository> {
    repo: R,
}

impl<R: CredentialRepository> CredentialService<R> {
    /// Creates a new credential service with the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Registers a new user.
    pub async fn add_user(&self, username: &str, password: &str) -> Result<Username, AppError> {
        let username = Username::parse(username)?;
        credential::validate_password(password)?;

        self.repo.add_user(&username, password).await?;
        Ok(username)
    }

    /// Removes a user.
    pub async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        let username = Username::parse(username)?;
        self.repo.delete_user(&username).await.map_err(Into::into)
    }

    /// Removes a user only if the password matches.
    ///
    /// Returns `false` (and deletes nothing) on a wrong password or an
    /// unknown user.
    pub async fn delete_user_verified(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        let Ok(name) = Username::parse(username) else {
            return Ok(false);
        };
        if !self.repo.verify(&name, password).await {
            return Ok(false);
        }

        self.repo.delete_user(&name).await?;
        Ok(true)
    }

    /// Checks credentials. Malformed usernames simply fail to verify.
    pub async fn verify(&self, username: &str, password: &str) -> bool {
        match Username::parse(username) {
            Ok(name) => self.repo.verify(&name, password).await,
            Err(_) => false,
        }
    }

    /// Checks credentials, returning the authenticated username.
    ///
    /// Every failure is the same `Unauthorized` error so callers cannot tell
    /// an unknown user from a wrong password.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Username, AppError> {
        let name = Username::parse(username).map_err(|_| AppError::Unauthorized)?;
        if self.repo.verify(&name, password).await {
            Ok(name)
        } else {
            Err(AppError::Unauthorized)
        }
    }

    /// Lists registered usernames.
    pub async fn list_users(&self) -> Result<Vec<Username>, AppError> {
        self.repo.list_users().await.map_err(Into::into)
    }
}
