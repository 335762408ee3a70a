//! Credential repository port trait.
//!
//! The JSON file store implements this trait; tests use in-memory doubles.

use crate::domain::Username;
use crate::error::StoreError;

/// The credential store port.
///
/// Mutations MUST be persisted before they return `Ok`. A failed flush must
/// leave the store as it was before the call.
#[async_trait::async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Hashes `password` with a fresh salt and stores the record.
    ///
    /// Fails with `DomainError::UserExists` if the username is taken; the
    /// existing record is left untouched.
    async fn add_user(&self, username: &Username, password: &str) -> Result<(), StoreError>;

    /// Removes a record. Fails with `DomainError::UserNotFound` if absent.
    async fn delete_user(&self, username: &Username) -> Result<(), StoreError>;

    /// Checks a password against the stored hash.
    ///
    /// Unknown usernames yield `false`, never an error.
    async fn verify(&self, username: &Username, password: &str) -> bool;

    /// Lists usernames in ascending order.
    async fn list_users(&self) -> Result<Vec<Username>, StoreError>;
}
