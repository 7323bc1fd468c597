//! Release update check.
//!
//! Best-effort: a newer tag on the project's releases feed prints a
//! notice, any failure is logged at debug and the run continues.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const RELEASES_URL: &str = "https://api.github.com/repos/gramscope/gramscope/releases/latest";

const CURRENT: &str = env!("CARGO_PKG_VERSION");

#[derive(Deserialize)]
struct LatestRelease {
    tag_name: String,
}

/// Print an update notice when a newer release exists. Never fails the run.
pub async fn notify_if_outdated(http: &Client) {
    match fetch_latest(http).await {
        Ok(latest) => {
            let latest = latest.trim_start_matches('v').to_string();
            if is_newer(&latest, CURRENT) {
                println!("⬆️  Version {latest} is available (you have {CURRENT})");
                println!("   https://github.com/gramscope/gramscope/releases");
            }
        }
        Err(e) => debug!(error = %e, "update check skipped"),
    }
}

async fn fetch_latest(http: &Client) -> Result<String, reqwest::Error> {
    let release: LatestRelease = http
        .get(RELEASES_URL)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(release.tag_name)
}

/// Compare dotted numeric versions; non-numeric segments compare as zero.
fn is_newer(candidate: &str, current: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(candidate), parse(current));
    let len = a.len().max(b.len());
    for i in 0..len {
        let (x, y) = (
            a.get(i).copied().unwrap_or(0),
            b.get(i).copied().unwrap_or(0),
        );
        if x != y {
            return x > y;
        }
    }
    false
}
