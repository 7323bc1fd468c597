use std::path::{Path, PathBuf};

use crate::models::CookieJar;

use super::{StoreError, Vault};

/// Cookie file name inside the data directory.
const COOKIES_FILE: &str = "cookies.bin";

/// Encrypted-at-rest storage for the session cookie jar.
pub struct SessionStore {
    path: PathBuf,
    vault: Vault,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(COOKIES_FILE),
            vault: Vault::new(data_dir),
        }
    }

    /// Load the saved jar. An absent file means no session; a file that
    /// fails to decrypt or parse is `CorruptSession` - never an empty jar,
    /// so a tampered or re-keyed file cannot masquerade as "not logged in".
    pub fn load(&self) -> Result<Option<CookieJar>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let blob = std::fs::read(&self.path)?;
        let plaintext = self
            .vault
            .open(&blob)?
            .ok_or(StoreError::CorruptSession)?;
        let jar: CookieJar =
            serde_json::from_slice(&plaintext).map_err(|_| StoreError::CorruptSession)?;
        Ok(Some(jar))
    }

    pub fn save(&self, jar: &CookieJar) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(jar)?;
        let blob = self.vault.seal(&plaintext)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, blob)?;
        Ok(())
    }

    /// Drop the saved session entirely.
    pub fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
