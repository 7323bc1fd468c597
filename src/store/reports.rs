use std::path::{Path, PathBuf};

use crate::models::{is_valid_username, Report};

use super::{StoreError, Vault};

/// Report directory name inside the data directory.
const REPORTS_DIR: &str = "reports";

/// One sealed report blob per target, overwritten on each successful run.
/// There is no history: the previous report for a target is replaced, not
/// appended to.
pub struct ReportStore {
    dir: PathBuf,
    vault: Vault,
}

impl ReportStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(REPORTS_DIR),
            vault: Vault::new(data_dir),
        }
    }

    /// The blob path is derived from the target handle, so the handle is
    /// validated before it can touch the filesystem.
    fn path_for(&self, target: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_username(target) {
            return Err(StoreError::InvalidTarget(target.to_string()));
        }
        Ok(self.dir.join(format!("{target}.bin")))
    }

    pub fn save(&self, report: &Report) -> Result<(), StoreError> {
        let path = self.path_for(&report.target)?;
        std::fs::create_dir_all(&self.dir)?;
        let plaintext = serde_json::to_vec(report)?;
        let blob = self.vault.seal(&plaintext)?;
        std::fs::write(path, blob)?;
        Ok(())
    }

    /// Load the stored report for a target. Absent is `None`; a blob that
    /// no longer decrypts is a distinct corrupt-report error.
    pub fn load(&self, target: &str) -> Result<Option<Report>, StoreError> {
        let path = self.path_for(target)?;
        if !path.exists() {
            return Ok(None);
        }
        let blob = std::fs::read(&path)?;
        let corrupt = || StoreError::CorruptReport {
            target: target.to_string(),
        };
        let plaintext = self.vault.open(&blob)?.ok_or_else(corrupt)?;
        let report: Report = serde_json::from_slice(&plaintext).map_err(|_| corrupt())?;
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff;
    use crate::models::{GroupSnapshot, UserRef};
    use crate::store::KeyManager;

    fn report(target: &str, follower_names: &[&str], following_names: &[&str]) -> Report {
        let followers: GroupSnapshot = follower_names
            .iter()
            .map(|n| UserRef::new(*n, ""))
            .collect();
        let followings: GroupSnapshot = following_names
            .iter()
            .map(|n| UserRef::new(*n, ""))
            .collect();
        let diff = diff::diff(&followers, &followings);
        Report::new(target, followers, followings, diff)
    }

    #[test]
    fn test_roundtrip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        KeyManager::new(dir.path()).generate().unwrap();
        let store = ReportStore::new(dir.path());

        store
            .save(&report("me", &["alice", "bob"], &["bob", "carol"]))
            .unwrap();
        let loaded = store.load("me").unwrap().unwrap();
        assert_eq!(loaded.followers.len(), 2);
        assert!(loaded.diff.not_following_back.contains("carol"));

        // A second save replaces the first outright.
        store.save(&report("me", &["alice"], &["alice"])).unwrap();
        let loaded = store.load("me").unwrap().unwrap();
        assert_eq!(loaded.followers.len(), 1);
        assert!(loaded.diff.not_following_back.is_empty());
    }

    #[test]
    fn test_absent_target_is_none() {
        let dir = tempfile::tempdir().unwrap();
        KeyManager::new(dir.path()).generate().unwrap();
        let store = ReportStore::new(dir.path());
        assert!(store.load("nobody").unwrap().is_none());
    }

    #[test]
    fn test_reports_are_keyed_by_target() {
        let dir = tempfile::tempdir().unwrap();
        KeyManager::new(dir.path()).generate().unwrap();
        let store = ReportStore::new(dir.path());

        store.save(&report("alpha", &["x"], &[])).unwrap();
        store.save(&report("beta", &[], &["y"])).unwrap();
        assert_eq!(store.load("alpha").unwrap().unwrap().followers.len(), 1);
        assert_eq!(store.load("beta").unwrap().unwrap().followings.len(), 1);
    }

    #[test]
    fn test_invalid_target_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        KeyManager::new(dir.path()).generate().unwrap();
        let store = ReportStore::new(dir.path());
        assert!(matches!(
            store.load("../../etc/passwd"),
            Err(StoreError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_rekeyed_report_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let keys = KeyManager::new(dir.path());
        keys.generate().unwrap();
        let store = ReportStore::new(dir.path());
        store.save(&report("me", &["a"], &["b"])).unwrap();

        keys.generate().unwrap();
        assert!(matches!(
            store.load("me"),
            Err(StoreError::CorruptReport { .. })
        ));
    }
}
