use std::path::Path;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};

use super::{KeyManager, StoreError};

/// XChaCha20-Poly1305 nonce size in bytes.
const NONCE_LEN: usize = 24;

/// Authenticated encryption over the key file.
///
/// Sealed blobs are `nonce || ciphertext` with a fresh random nonce per
/// seal. The key is re-read from disk on every operation, so a key
/// regenerated mid-process is picked up immediately and is never cached
/// across process lifetimes.
pub struct Vault {
    keys: KeyManager,
}

impl Vault {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            keys: KeyManager::new(data_dir),
        }
    }

    fn cipher(&self) -> Result<XChaCha20Poly1305, StoreError> {
        let key = self.keys.load()?;
        XChaCha20Poly1305::new_from_slice(&key)
            .map_err(|_| StoreError::Io(std::io::Error::other("key file has the wrong length")))
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
        let cipher = self.cipher()?;
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| StoreError::Io(std::io::Error::other("encryption failed")))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Open a sealed blob. Returns `None` on any authentication failure so
    /// callers can attach the error variant that names what was corrupt.
    pub fn open(&self, blob: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if blob.len() <= NONCE_LEN {
            return Ok(None);
        }
        let cipher = self.cipher()?;
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        Ok(cipher.decrypt(XNonce::from_slice(nonce), ciphertext).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        KeyManager::new(dir.path()).generate().unwrap();
        let vault = Vault::new(dir.path());

        let blob = vault.seal(b"secret payload").unwrap();
        assert_ne!(&blob[NONCE_LEN..], b"secret payload".as_slice());
        assert_eq!(vault.open(&blob).unwrap().as_deref(), Some(b"secret payload".as_slice()));
    }

    #[test]
    fn test_seal_without_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::new(dir.path());
        assert!(matches!(vault.seal(b"x"), Err(StoreError::MissingKey(_))));
    }

    #[test]
    fn test_open_with_regenerated_key_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let keys = KeyManager::new(dir.path());
        keys.generate().unwrap();
        let vault = Vault::new(dir.path());
        let blob = vault.seal(b"payload").unwrap();

        // Key rotation happens underneath the vault; the next open must
        // observe the new key and refuse the old blob.
        keys.generate().unwrap();
        assert_eq!(vault.open(&blob).unwrap(), None);
    }

    #[test]
    fn test_open_tampered_blob_fails() {
        let dir = tempfile::tempdir().unwrap();
        KeyManager::new(dir.path()).generate().unwrap();
        let vault = Vault::new(dir.path());

        let mut blob = vault.seal(b"payload").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert_eq!(vault.open(&blob).unwrap(), None);
    }

    #[test]
    fn test_open_truncated_blob_fails() {
        let dir = tempfile::tempdir().unwrap();
        KeyManager::new(dir.path()).generate().unwrap();
        let vault = Vault::new(dir.path());
        assert_eq!(vault.open(&[0u8; 10]).unwrap(), None);
    }
}
