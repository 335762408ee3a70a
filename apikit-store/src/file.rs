//! JSON file credential store.
//!
//! The whole file is loaded into memory on open and rewritten on every
//! mutation. Writes go to a sibling temp file which is then renamed over the
//! target, so readers of the file never observe a partial write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use apikit_types::{CredentialRecord, CredentialRepository, DomainError, StoreError, Username};

use crate::security::{CredentialHasher, HashingCost};

type Records = BTreeMap<Username, String>;

// ─────────────────────────────────────────────────────────────────────────────
// File Store
// ─────────────────────────────────────────────────────────────────────────────

/// Credential store backed by a flat JSON file mapping username to hash.
pub struct FileCredentialStore {
    path: PathBuf,
    records: RwLock<Records>,
    hasher: CredentialHasher,
    /// Compared against when the username is unknown.
    dummy_hash: String,
}

impl FileCredentialStore {
    /// Opens the store with the default hashing cost.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first mutation.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_cost(path, HashingCost::default()).await
    }

    /// Opens the store hashing new passwords with the given cost.
    pub async fn open_with_cost(
        path: impl Into<PathBuf>,
        cost: HashingCost,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let hasher = CredentialHasher::new(cost)?;
        let records = load(&path).await?;
        let dummy_hash = hash_blocking(&hasher, "apikit-unknown-user".to_string()).await?;

        tracing::debug!(
            path = %path.display(),
            users = records.len(),
            "Credential store loaded"
        );

        Ok(Self {
            path,
            records: RwLock::new(records),
            hasher,
            dummy_hash,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the backing file, replacing the in-memory records.
    pub async fn reload(&self) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        *records = load(&self.path).await?;
        tracing::debug!(users = records.len(), "Credential store reloaded");
        Ok(())
    }

    /// Number of stored users.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn contains(&self, username: &Username) -> bool {
        self.records.read().await.contains_key(username)
    }

    /// Returns the stored record for a user.
    pub async fn get_record(&self, username: &Username) -> Option<CredentialRecord> {
        self.records
            .read()
            .await
            .get(username)
            .map(|hash| CredentialRecord::new(username.clone(), hash.clone()))
    }
}

#[async_trait]
impl CredentialRepository for FileCredentialStore {
    #[tracing::instrument(skip(self, password), fields(username = %username))]
    async fn add_user(&self, username: &Username, password: &str) -> Result<(), StoreError> {
        // Cheap early rejection; re-checked under the write lock below.
        if self.contains(username).await {
            return Err(DomainError::UserExists(username.clone()).into());
        }

        let hash = hash_blocking(&self.hasher, password.to_string()).await?;

        let mut records = self.records.write().await;
        if records.contains_key(username) {
            return Err(DomainError::UserExists(username.clone()).into());
        }

        records.insert(username.clone(), hash);
        if let Err(e) = persist(&self.path, &records).await {
            records.remove(username);
            return Err(e);
        }

        tracing::info!("User added");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(username = %username))]
    async fn delete_user(&self, username: &Username) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let Some(hash) = records.remove(username) else {
            return Err(DomainError::UserNotFound(username.clone()).into());
        };

        if let Err(e) = persist(&self.path, &records).await {
            records.insert(username.clone(), hash);
            return Err(e);
        }

        tracing::info!("User deleted");
        Ok(())
    }

    async fn verify(&self, username: &Username, password: &str) -> bool {
        let (hash, known) = match self.records.read().await.get(username) {
            Some(hash) => (hash.clone(), true),
            None => (self.dummy_hash.clone(), false),
        };

        let password = password.to_string();
        let matched =
            tokio::task::spawn_blocking(move || CredentialHasher::verify(&hash, &password))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Password verification task failed: {}", e);
                    false
                });

        known && matched
    }

    async fn list_users(&self) -> Result<Vec<Username>, StoreError> {
        Ok(self.records.read().await.keys().cloned().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn hash_blocking(hasher: &CredentialHasher, password: String) -> Result<String, StoreError> {
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| StoreError::Hashing(e.to_string()))?
}

async fn load(path: &Path) -> Result<Records, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Records::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No credential file yet, starting empty");
            Ok(Records::new())
        }
        Err(e) => Err(e.into()),
    }
}

async fn persist(path: &Path, records: &Records) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_vec_pretty(records)?;
    let tmp = temp_path(path);

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&json).await?;
    // Contents must be durable before the rename makes them visible.
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
