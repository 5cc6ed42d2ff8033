use colored::Colorize;

use crate::browser::{BrowserSession, SessionStatus};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::publisher::StateStore;

/// Clear the persisted run state and report progress. A live driver notices
/// at its next cycle guard; its in-flight wait is not interrupted.
pub async fn run(cli: &Cli) -> Result<()> {
    let store = StateStore::new();
    let state = store.load()?;
    store.clear()?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "was_active": state.active,
                "published": state.count
            })
        );
        return Ok(());
    }

    if state.active {
        println!("{} Publish run stopped.", "✓".green());
        println!(
            "  Published so far: {}",
            state.count.to_string().bold()
        );

        // Reload the page so it reflects reality after the run; best-effort.
        let config = Config::load()?;
        let session = BrowserSession::new(config.browser.clone());
        if matches!(session.status().await, SessionStatus::Running { .. }) {
            if let Err(e) = session.reload().await {
                tracing::debug!("reload after stop failed: {}", e);
            }
        }
    } else {
        println!("{} No publish run is active.", "○".dimmed());
    }

    Ok(())
}
