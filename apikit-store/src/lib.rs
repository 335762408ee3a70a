//! # Apikit Store
//!
//! Credential store adapter for the endpoint layer.
//! The store keeps `username -> salted hash` records in a flat JSON file
//! and implements the `CredentialRepository` port.

pub mod file;
pub mod security;


pub use file::FileCredentialStore;
pub use security::{CredentialHasher, HashingCost};

/// Default location of the credential file.
pub const DEFAULT_CREDENTIALS_FILE: &str = "user_credentials.json";

/// Opens the credential store at `path` with default hashing cost.
///
/// # Examples
///
/// ```ignore
/// let store = open_store("user_credentials.json").await?;
/// store.add_user(&"alice".parse()?, "secret").await?;
/// ```
pub async fn open_store(path: impl AsRef<std::path::Path>) -> anyhow::Result<FileCredentialStore> {
    let store = FileCredentialStore::open(path.as_ref()).await?;
    Ok(store)
}
