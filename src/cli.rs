use clap::{Parser, Subcommand};

use crate::commands;
use crate::error::Result;

/// Notepub CLI - bulk-publish note.com drafts without manual clicking
#[derive(Parser)]
#[command(name = "notepub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Browser executable path (overrides auto-discovery)
    #[arg(long, env = "NOTEPUB_BROWSER_PATH", global = true)]
    pub browser_path: Option<String>,

    /// CDP port or WebSocket URL of an already-running browser
    #[arg(long, env = "NOTEPUB_CDP", global = true)]
    pub cdp: Option<String>,

    /// Run the browser in headless mode
    #[arg(long, env = "NOTEPUB_HEADLESS", global = true)]
    pub headless: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a publish run over the drafts in the draft list
    Run {
        /// Number of drafts to publish (0 = all). Prompts when omitted.
        #[arg(short, long)]
        count: Option<u32>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Stop the active publish run and report progress
    Stop,

    /// Show browser, session, and publish-run status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. browser.headless)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show configuration file path
    Path,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Run { count, yes } => commands::run::run(self, *count, *yes).await,
            Commands::Stop => commands::stop::run(self).await,
            Commands::Status => commands::status::run(self).await,
            Commands::Config { command } => commands::config::run(self, command).await,
        }
    }
}
