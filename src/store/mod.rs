//! Encrypted local storage: the key file, the sealed cookie jar, and the
//! per-target report blobs.
//!
//! Everything written here is opaque at rest. The key file is the single
//! secret; losing it makes the cookie jar and every stored report
//! permanently unrecoverable, and nothing in this module will paper over
//! that - decryption failures surface as distinct errors, never as empty
//! data.

mod key;
mod reports;
mod session;
mod vault;

pub use key::KeyManager;
pub use reports::ReportStore;
pub use session::SessionStore;
pub use vault::Vault;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("encryption key not found at {0} - run `gramscope generate-key` first")]
    MissingKey(PathBuf),

    #[error("saved session could not be decrypted - the key changed or the file is damaged; regenerate the key and log in again")]
    CorruptSession,

    #[error("stored report for '{target}' could not be decrypted - the key changed or the file is damaged")]
    CorruptReport { target: String },

    #[error("'{0}' is not a valid account name")]
    InvalidTarget(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
