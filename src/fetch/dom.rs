//! Scroll-and-extract fetch over a rendered profile dialog.
//!
//! The browser binding itself is not part of this crate: a `PageDriver`
//! implementation supplies navigation, scrolling, and the rendered HTML,
//! and `DomFetcher` owns the scroll loop and username extraction. Display
//! names are not reliably present in the rendered dialog, so this variant
//! yields usernames only - which is the identity key, so diffs and
//! reports are unaffected.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::models::{GroupSnapshot, UserRef};

use super::{FetchError, GroupFetcher, GroupKind};

/// Public profile URL prefix for dialog navigation.
const BASE_URL: &str = "https://www.instagram.com";

/// Site paths that look like profile links but aren't accounts.
const RESERVED_PATHS: &[&str] = &[
    "explore", "accounts", "direct", "reels", "reel", "stories", "p", "about", "legal",
];

/// How the scroll loop paces itself.
#[derive(Debug, Clone, Copy)]
pub struct ScrollPolicy {
    /// Pause between scroll steps, letting the dialog load more entries.
    pub delay: Duration,
    /// Consecutive no-growth rounds tolerated before the list is
    /// considered complete.
    pub idle_retries: u32,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            idle_retries: 5,
        }
    }
}

/// Seam to the actual browser automation (external collaborator).
#[async_trait]
pub trait PageDriver: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), FetchError>;

    /// Scroll the open relation dialog one step.
    async fn scroll(&mut self) -> Result<(), FetchError>;

    /// Rendered HTML of the page in its current state.
    async fn content(&mut self) -> Result<String, FetchError>;
}

pub struct DomFetcher<D: PageDriver> {
    driver: D,
    policy: ScrollPolicy,
}

impl<D: PageDriver> DomFetcher<D> {
    pub fn new(driver: D, policy: ScrollPolicy) -> Self {
        Self { driver, policy }
    }

    pub fn into_inner(self) -> D {
        self.driver
    }
}

#[async_trait]
impl<D: PageDriver> GroupFetcher for DomFetcher<D> {
    /// `target` is the profile handle here, not a numeric id.
    async fn fetch(
        &mut self,
        target: &str,
        kind: GroupKind,
    ) -> Result<GroupSnapshot, FetchError> {
        let url = format!("{BASE_URL}/{target}/{}/", kind.dialog_path());
        self.driver.navigate(&url).await?;

        let mut snapshot = GroupSnapshot::new();
        let mut idle = 0;

        loop {
            let html = self.driver.content().await?;
            let before = snapshot.len();
            for username in extract_usernames(&html) {
                if username != target {
                    snapshot.insert(UserRef::new(username, ""));
                }
            }

            if snapshot.len() == before {
                idle += 1;
                if idle > self.policy.idle_retries {
                    break;
                }
            } else {
                idle = 0;
            }

            self.driver.scroll().await?;
            tokio::time::sleep(self.policy.delay).await;
        }

        debug!(%kind, total = snapshot.len(), "dialog exhausted");
        Ok(snapshot)
    }
}

/// Pull profile handles out of rendered dialog HTML.
fn extract_usernames(html: &str) -> Vec<String> {
    static PROFILE_LINK: OnceLock<Regex> = OnceLock::new();
    let re = PROFILE_LINK
        .get_or_init(|| Regex::new(r#"href="/([A-Za-z0-9._]+)/""#).expect("valid regex"));
    re.captures_iter(html)
        .map(|c| c[1].to_string())
        .filter(|u| !RESERVED_PATHS.contains(&u.as_str()))
        .collect()
}
