use colored::Colorize;

use crate::browser::{discover_all_browsers, BrowserSession, SessionStatus};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::publisher::{classify, Page, StateStore};

/// Read-only status surface: detected browsers, browser session, persisted
/// run state, and whether the active tab sits on the draft list.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let store = StateStore::new();
    let state = store.load()?;

    let session = BrowserSession::new(config.browser.clone());
    let session_status = session.status().await;

    let active_tab = match &session_status {
        SessionStatus::Running { .. } => session.active_page().await.ok(),
        _ => None,
    };
    let on_draft_list = active_tab
        .as_ref()
        .map(|page| classify(&page.url) == Page::DraftList)
        .unwrap_or(false);

    if cli.json {
        let session_json = match &session_status {
            SessionStatus::Running { cdp_port, cdp_url } => serde_json::json!({
                "state": "running",
                "cdp_port": cdp_port,
                "cdp_url": cdp_url
            }),
            SessionStatus::Stale => serde_json::json!({ "state": "stale" }),
            SessionStatus::NotRunning => serde_json::json!({ "state": "not_running" }),
        };
        println!(
            "{}",
            serde_json::json!({
                "run": {
                    "active": state.active,
                    "published": state.count,
                    "max_count": state.max_count
                },
                "session": session_json,
                "active_tab": active_tab.as_ref().map(|p| p.url.clone()),
                "on_draft_list": on_draft_list
            })
        );
        return Ok(());
    }

    println!("{}", "Publish Run:".bold());
    if state.active {
        println!(
            "  {} Active: {} published (target: {})",
            "✓".green(),
            state.count,
            state.target_label()
        );
    } else {
        println!("  {} No run in progress", "○".dimmed());
    }
    println!();

    println!("{}", "Detected Browsers:".bold());
    let browsers = discover_all_browsers();
    if browsers.is_empty() {
        println!("  {} No browsers found", "!".yellow());
    } else {
        for browser in browsers {
            println!(
                "  {} {} {}",
                "✓".green(),
                browser.browser_type.name(),
                browser
                    .version
                    .map(|v| format!("(v{})", v))
                    .unwrap_or_default()
                    .dimmed()
            );
            println!("    {}", browser.path.display().to_string().dimmed());
        }
    }
    println!();

    println!("{}", "Browser Session:".bold());
    match &session_status {
        SessionStatus::Running { cdp_port, cdp_url } => {
            println!("  {} CDP Port: {}", "✓".green(), cdp_port);
            println!("  {} CDP URL: {}", "✓".green(), cdp_url.dimmed());

            if let Some(page) = &active_tab {
                println!();
                println!("{}", "Active Tab:".bold());
                if !page.title.is_empty() {
                    println!("  {}", page.title.bold());
                }
                println!("  {}", page.url.dimmed());
                if on_draft_list {
                    println!(
                        "  {} On the draft list — ready to publish",
                        "✓".green()
                    );
                } else {
                    println!(
                        "  {} Not on the draft list ({})",
                        "○".dimmed(),
                        classify(&page.url)
                    );
                }
            }
        }
        SessionStatus::Stale => {
            println!("  {} Stale session (browser no longer reachable)", "!".yellow());
        }
        SessionStatus::NotRunning => {
            println!("  {} Not running", "○".dimmed());
        }
    }

    Ok(())
}
