//! Set differences between the followers and followings snapshots.

use crate::models::{DiffResult, GroupSnapshot};

/// Compute who doesn't follow back, in both directions.
///
/// Pure and deterministic: membership is decided by username alone, so an
/// account present in both snapshots is excluded from both differences even
/// when its display name differs between them.
pub fn diff(followers: &GroupSnapshot, followings: &GroupSnapshot) -> DiffResult {
    let not_following_back = followings
        .iter()
        .filter(|u| !followers.contains(&u.username))
        .cloned()
        .collect();

    let not_followed_back = followers
        .iter()
        .filter(|u| !followings.contains(&u.username))
        .cloned()
        .collect();

    DiffResult {
        not_following_back,
        not_followed_back,
    }
}
