//! Run orchestration.
//!
//! One run is strictly sequential: key gate, saved-session load,
//! authentication, rate gate, follower/following fetch, diff, report.
//! Every failure along the way is fatal to the run - the session is
//! dropped (releasing the transport) and a distinct message reaches the
//! user; rerunning is the only retry.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::warn;

use crate::api::InstaClient;
use crate::auth::{AuthSession, TerminalPrompt};
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::diff;
use crate::fetch::{GraphqlFetcher, GroupFetcher, GroupKind};
use crate::models::{is_valid_username, Report};
use crate::rate::{Decision, RateGate};
use crate::store::{KeyManager, ReportStore, SessionStore, StoreError};
use crate::update;

pub async fn run(mut cli: Cli) -> Result<()> {
    let mut config = Config::load().context("failed to load config")?;
    let data_dir = Config::data_dir()?;

    match cli.command.take() {
        Some(Command::GenerateKey { force }) => generate_key(&KeyManager::new(&data_dir), force),
        Some(Command::ShowLast { target }) => show_last(target, &config, &data_dir),
        None => fetch_and_report(cli, &mut config, &data_dir).await,
    }
}

/// Generate the encryption key, confirming before an existing key (and
/// with it everything encrypted so far) is destroyed.
fn generate_key(keys: &KeyManager, force: bool) -> Result<()> {
    if keys.exists() && !force {
        println!("⚠️  A key already exists at {}", keys.path().display());
        println!("   Replacing it makes the saved session and every stored report unreadable.");
        if !confirm("   Type 'yes' to replace it: ")? {
            println!("🚫 Keeping the existing key");
            return Ok(());
        }
    }
    keys.generate()?;
    println!("🔐 New encryption key written to {}", keys.path().display());
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}

/// Print the stored report for a target. Never rate-gated: the cooldown
/// only restricts fetching.
fn show_last(target: Option<String>, config: &Config, data_dir: &std::path::Path) -> Result<()> {
    let target = target
        .or_else(|| config.last_username.clone())
        .context("no target given and no remembered username; pass one explicitly")?;

    let store = ReportStore::new(data_dir);
    match store.load(&target)? {
        Some(report) => {
            println!(
                "🗂️  Report for {} captured {}",
                report.target,
                report.captured_at.format("%Y-%m-%d %H:%M")
            );
            println!(
                "👥 {} followers, {} followings",
                report.followers.len(),
                report.followings.len()
            );
            print_summary(&report);
        }
        None => println!("🤷 No stored report for {target}"),
    }
    Ok(())
}

async fn fetch_and_report(
    cli: Cli,
    config: &mut Config,
    data_dir: &std::path::Path,
) -> Result<()> {
    let keys = KeyManager::new(data_dir);
    if !keys.exists() {
        return Err(StoreError::MissingKey(keys.path().to_path_buf()).into());
    }

    println!("🚀 Getting the environment ready...");
    let session_store = SessionStore::new(data_dir);
    let saved_jar = session_store.load()?;
    let had_session = saved_jar.is_some();
    let client = InstaClient::new(saved_jar.unwrap_or_default())?;

    if !cli.no_update_check {
        update::notify_if_outdated(&client.http()).await;
    }

    println!("🛡️  Checking login status");
    let mut auth = AuthSession::new(client);
    let mut prompt = TerminalPrompt::new(config.last_username.clone());
    let try_existing = had_session && !cli.ask_login;
    let username = auth.authenticate(&mut prompt, try_existing).await?;
    let mut client = auth.into_inner();
    println!("🔓 Logged in as {username}");

    // Cookies persist before anything else happens with the session.
    session_store.save(client.cookies())?;

    if config.last_username.as_deref() != Some(username.as_str()) {
        config.last_username = Some(username.clone());
        if let Err(e) = config.save() {
            warn!(error = %e, "could not remember username");
        }
    }

    let target = cli.target.unwrap_or_else(|| username.clone());
    if !is_valid_username(&target) {
        return Err(StoreError::InvalidTarget(target).into());
    }

    let report_store = ReportStore::new(data_dir);
    let previous = match report_store.load(&target) {
        Ok(previous) => previous,
        // A report sealed under a replaced key cannot gate anything; the
        // run will overwrite it with a readable one.
        Err(StoreError::CorruptReport { .. }) => {
            warn!(target = %target, "stored report unreadable, ignoring for rate check");
            None
        }
        Err(e) => return Err(e.into()),
    };
    if let Decision::Denied { last_update } = RateGate::new().check(previous.as_ref()) {
        println!("🚫 Halted: wait 60 minutes between fetches for the same account");
        println!("🕒 Last update was on {}", last_update.format("%Y-%m-%d %H:%M"));
        return Ok(());
    }

    println!("⏳ Getting followers/followings, this may take a while...");
    let user_id = client.resolve_user_id(&target).await?;
    let mut fetcher = GraphqlFetcher::new(client);
    let followers = fetcher.fetch(&user_id, GroupKind::Followers).await?;
    println!("👥 Followers fetched successfully ({})", followers.len());
    let followings = fetcher.fetch(&user_id, GroupKind::Followings).await?;
    println!("👥 Followings fetched successfully ({})", followings.len());

    println!("📊 Almost done, doing some maths...");
    let diff = diff::diff(&followers, &followings);
    let report = Report::new(target.as_str(), followers, followings, diff);
    print_summary(&report);

    report_store.save(&report)?;
    println!("✅ Done, report saved");
    Ok(())
}

fn print_summary(report: &Report) {
    let not_following_back = report.diff.sorted_not_following_back();
    if not_following_back.is_empty() {
        println!("🤩 Congratulations, everyone follows you back!");
    } else {
        println!("🔎 Users who don't follow you back ({}):", not_following_back.len());
        for (index, user) in not_following_back.iter().enumerate() {
            println!("   {}. {}", index + 1, user.display());
        }
    }

    let not_followed_back = report.diff.sorted_not_followed_back();
    if !not_followed_back.is_empty() {
        println!("👀 Followers you don't follow back ({}):", not_followed_back.len());
        for (index, user) in not_followed_back.iter().enumerate() {
            println!("   {}. {}", index + 1, user.display());
        }
    }
}
