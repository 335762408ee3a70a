//! Credential domain model.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest username accepted, in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// A validated username.
///
/// Usernames are the unique key of the credential store and travel inside
/// HTTP Basic credentials, so they may not contain `:` or control characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Parses and validates a username.
    ///
    /// # Validation
    /// - Cannot be empty or whitespace only
    /// - At most [`MAX_USERNAME_LEN`] bytes
    /// - No `:` and no control characters
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidUsername(
                "Username cannot be empty".into(),
            ));
        }
        if raw.len() > MAX_USERNAME_LEN {
            return Err(DomainError::InvalidUsername(format!(
                "Username cannot exceed {} bytes",
                MAX_USERNAME_LEN
            )));
        }
        if raw.contains(':') {
            return Err(DomainError::InvalidUsername(
                "Username cannot contain ':'".into(),
            ));
        }
        if raw.chars().any(char::is_control) {
            return Err(DomainError::InvalidUsername(
                "Username cannot contain control characters".into(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Rejects empty passwords. Everything else is accepted as-is.
pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.is_empty() {
        return Err(DomainError::EmptyPassword);
    }
    Ok(())
}

/// A stored credential: the username and its salted password hash.
///
/// The hash is a self-describing PHC string, so the salt and the hashing
/// parameters travel with it. Plaintext passwords never reach this type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub username: Username,
    pub password_hash: String,
}

impl CredentialRecord {
    pub fn new(username: Username, password_hash: String) -> Self {
        Self {
            username,
            password_hash,
        }
    }
}

// Keep hashes out of logs.
impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}
