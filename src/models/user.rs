use std::borrow::Borrow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A reference to an account as seen in a follower/following listing.
///
/// The username is the sole identity key: two `UserRef`s with the same
/// username compare equal even if the display name differs between the
/// followers and following snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
}

impl UserRef {
    pub fn new(username: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            full_name: full_name.into(),
        }
    }

    /// Display form used in console listings: `Full Name (username)`,
    /// or just the username when no display name is known.
    pub fn display(&self) -> String {
        if self.full_name.is_empty() {
            self.username.clone()
        } else {
            format!("{} ({})", self.full_name, self.username)
        }
    }
}

impl PartialEq for UserRef {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
    }
}

impl Eq for UserRef {}

impl Hash for UserRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.username.hash(state);
    }
}

impl PartialOrd for UserRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.username.cmp(&other.username)
    }
}

impl Borrow<str> for UserRef {
    fn borrow(&self) -> &str {
        &self.username
    }
}

/// Instagram handles are 1-30 characters of letters, digits, periods and
/// underscores. Report paths are derived from the handle, so anything else
/// is rejected before it can reach the filesystem.
pub fn is_valid_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 30
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}
