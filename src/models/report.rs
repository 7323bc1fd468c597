use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRef;

/// One relation list (followers or followings) for one target, captured at a
/// single point in time. Membership is a set keyed by username; the order in
/// which pages arrived carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    users: HashSet<UserRef>,
}

impl GroupSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user. A second entry with the same username is a no-op.
    pub fn insert(&mut self, user: UserRef) -> bool {
        self.users.insert(user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains(username)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserRef> {
        self.users.iter()
    }

    /// Members sorted by username, for stable display.
    pub fn sorted(&self) -> Vec<&UserRef> {
        let mut v: Vec<&UserRef> = self.users.iter().collect();
        v.sort();
        v
    }
}

impl FromIterator<UserRef> for GroupSnapshot {
    fn from_iter<I: IntoIterator<Item = UserRef>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}

/// The asymmetric differences between a followers and a followings snapshot.
/// Always recomputable from the two snapshots; persisted only as part of a
/// [`Report`] for display without refetching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Accounts the target follows that do not follow back.
    pub not_following_back: HashSet<UserRef>,
    /// Accounts following the target that the target does not follow back.
    pub not_followed_back: HashSet<UserRef>,
}

impl DiffResult {
    pub fn sorted_not_following_back(&self) -> Vec<&UserRef> {
        let mut v: Vec<&UserRef> = self.not_following_back.iter().collect();
        v.sort();
        v
    }

    pub fn sorted_not_followed_back(&self) -> Vec<&UserRef> {
        let mut v: Vec<&UserRef> = self.not_followed_back.iter().collect();
        v.sort();
        v
    }
}

/// The persisted outcome of one successful run. Exactly one report is kept
/// per target; a new run overwrites the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub target: String,
    pub followers: GroupSnapshot,
    pub followings: GroupSnapshot,
    pub diff: DiffResult,
    pub captured_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        target: impl Into<String>,
        followers: GroupSnapshot,
        followings: GroupSnapshot,
        diff: DiffResult,
    ) -> Self {
        Self {
            target: target.into(),
            followers,
            followings,
            diff,
            captured_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.captured_at).num_minutes()
    }
}
