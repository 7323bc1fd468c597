use std::path::{Path, PathBuf};

use rand::{rngs::OsRng, RngCore};

use super::StoreError;

/// Size of the symmetric key in bytes (XChaCha20-Poly1305).
pub(crate) const KEY_LEN: usize = 32;

/// Key file name inside the data directory.
const KEY_FILE: &str = "passkey.key";

/// Owns the encryption key file.
///
/// The key is random bytes, generated once and reused across runs; it is
/// never derived from user input. Whether an existing key may be
/// overwritten is the caller's decision - `generate` replaces whatever is
/// there, so the CLI confirms with the user first.
pub struct KeyManager {
    path: PathBuf,
}

impl KeyManager {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(KEY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Generate and persist a fresh key, replacing any existing one.
    pub fn generate(&self) -> Result<(), StoreError> {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, key)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Read the key material. Always re-reads the file so a regenerated key
    /// takes effect without restarting.
    pub fn load(&self) -> Result<Vec<u8>, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::MissingKey(self.path.clone()));
        }
        Ok(std::fs::read(&self.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::new(dir.path());
        assert!(!manager.exists());

        manager.generate().unwrap();
        assert!(manager.exists());
        let key = manager.load().unwrap();
        assert_eq!(key.len(), KEY_LEN);
    }

    #[test]
    fn test_generate_replaces_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::new(dir.path());
        manager.generate().unwrap();
        let first = manager.load().unwrap();
        manager.generate().unwrap();
        let second = manager.load().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_load_missing_key_is_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = KeyManager::new(dir.path());
        assert!(matches!(manager.load(), Err(StoreError::MissingKey(_))));
    }
}
