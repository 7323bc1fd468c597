//! Command-line surface.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gramscope", version, about = "Find out who doesn't follow you back")]
pub struct Cli {
    /// Ask for login credentials even when a saved session exists
    #[arg(short = 'a', long)]
    pub ask_login: bool,

    /// Inspect this profile instead of the logged-in account
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip the release update check
    #[arg(long)]
    pub no_update_check: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a new encryption key for cookies and reports.
    /// Replacing an existing key makes everything encrypted with it
    /// unreadable, so overwriting asks for confirmation.
    GenerateKey {
        /// Overwrite an existing key without asking
        #[arg(long)]
        force: bool,
    },

    /// Print the last saved report without fetching anything
    ShowLast {
        /// Profile the report was captured for; defaults to the
        /// remembered login username
        target: Option<String>,
    },
}
