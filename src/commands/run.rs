use std::time::Duration;

use colored::Colorize;
use dialoguer::{Confirm, Input};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

use crate::browser::BrowserSession;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{NotepubError, Result};
use crate::publisher::{await_condition, CycleOutcome, Engine, RunState, StateStore};

pub async fn run(cli: &Cli, count: Option<u32>, yes: bool) -> Result<()> {
    let config = Config::load()?;
    let store = StateStore::new();

    let existing = store.load()?;
    let starting_fresh = !existing.active;
    let state = if existing.active {
        // A run is already armed (e.g. paused on an unrecognized page or the
        // driver was killed); resume it instead of starting over.
        println!(
            "{} Resuming active run: {} published, target {}",
            "✓".green(),
            existing.count,
            existing.target_label()
        );
        existing
    } else {
        let max_count = resolve_target(cli, count)?;
        let state = RunState::start(max_count);

        if !yes && !cli.json {
            let confirm = Confirm::new()
                .with_prompt(format!(
                    "Publish {} from the draft list? Leave the browser alone while the run is active.",
                    state.target_label()
                ))
                .default(false)
                .interact()
                .map_err(|e| NotepubError::Other(format!("Prompt failed: {}", e)))?;

            if !confirm {
                println!("  Cancelled.");
                return Ok(());
            }
        }

        state
    };

    let session = BrowserSession::new(config.browser.clone())
        .with_overrides(cli.browser_path.clone(), cli.headless);

    // When --cdp is set, resolve it to a fresh WebSocket URL and persist it
    // as the active session before connecting.
    if let Some(cdp) = &cli.cdp {
        apply_cdp_override(&session, cdp).await?;
    }

    let (browser, mut handler) = session.ensure().await?;
    tokio::spawn(async move { while handler.next().await.is_some() {} });

    // Point the browser at the draft list; a fresh launch may have no page yet
    if starting_fresh {
        let has_pages = session.get_pages().await.map(|p| !p.is_empty()).unwrap_or(false);
        if has_pages {
            session.goto(&config.site.draft_list_url).await?;
        } else {
            browser
                .new_page(&config.site.draft_list_url)
                .await
                .map_err(|e| NotepubError::Other(format!("Failed to open draft list: {}", e)))?;
        }

        // Don't arm the state machine until the draft list is actually the
        // current page, or the first cycle could act on whatever was open.
        let on_draft_list = format!(
            "document.location.href.startsWith({}) && document.readyState === 'complete'",
            serde_json::to_string(&config.site.draft_list_url)?
        );
        await_condition(
            &session,
            &on_draft_list,
            Duration::from_millis(config.timing.nav_timeout_ms),
            Duration::from_millis(config.timing.poll_interval_ms),
            "draft list",
        )
        .await?;

        store.save(&state)?;
        println!(
            "{} Publish run started ({})",
            "✓".green(),
            state.target_label()
        );
    }

    match drive(cli, &session, &store, &config, &state).await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Fatal-to-the-run policy: no retry. Report the error with the
            // progress so far, then clear the persisted state.
            let published = store.load().map(|s| s.count).unwrap_or(0);
            store.clear()?;
            tracing::error!("publish run aborted: {}", e);

            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                        "published": published
                    })
                );
            } else {
                eprintln!("{} Publish run aborted: {}", "✗".red(), e);
                eprintln!("  Published so far: {}", published.to_string().bold());
            }
            Err(e)
        }
    }
}

/// Target count from the flag, or an interactive prompt (0 = all)
fn resolve_target(cli: &Cli, count: Option<u32>) -> Result<u32> {
    match count {
        Some(n) => Ok(n),
        None if cli.json => Err(NotepubError::Other(
            "--count is required with --json".to_string(),
        )),
        None => Input::<u32>::new()
            .with_prompt("How many drafts to publish? (0 = all)")
            .default(0)
            .interact_text()
            .map_err(|e| NotepubError::Other(format!("Prompt failed: {}", e))),
    }
}

/// Drive state-machine cycles until the run completes, stops, or pauses
async fn drive(
    cli: &Cli,
    session: &BrowserSession,
    store: &StateStore,
    config: &Config,
    state: &RunState,
) -> Result<()> {
    let engine = Engine::new(session, store, config);
    let bar = progress_bar(cli, state);

    loop {
        match engine.cycle().await? {
            CycleOutcome::Advanced => {}
            CycleOutcome::Published { count } => {
                if let Some(bar) = &bar {
                    if state.max_count > 0 {
                        bar.set_position(count as u64);
                    } else {
                        bar.set_message(format!("{} published", count));
                    }
                }
            }
            CycleOutcome::Complete { count, reason } => {
                if let Some(bar) = &bar {
                    bar.finish_and_clear();
                }
                if cli.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "success": true,
                            "published": count,
                            "reason": reason.to_string()
                        })
                    );
                } else {
                    println!(
                        "{} Publish run complete! {} article(s) published. ({})",
                        "✓".green(),
                        count.to_string().bold(),
                        reason
                    );
                }
                return Ok(());
            }
            CycleOutcome::Stopped { count } => {
                if let Some(bar) = &bar {
                    bar.finish_and_clear();
                }
                if cli.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "success": true,
                            "published": count,
                            "reason": "stopped"
                        })
                    );
                } else {
                    println!(
                        "{} Publish run stopped. {} article(s) published.",
                        "○".dimmed(),
                        count
                    );
                }
                return Ok(());
            }
            CycleOutcome::Paused { url } => {
                if let Some(bar) = &bar {
                    bar.finish_and_clear();
                }
                if cli.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "success": false,
                            "reason": "paused",
                            "url": url
                        })
                    );
                } else {
                    println!(
                        "{} Automation paused on an unrecognized page:",
                        "!".yellow()
                    );
                    println!("  {}", url.dimmed());
                    println!(
                        "  The run stays armed. Navigate back to the draft list and re-run 'notepub run', or 'notepub stop' to end it."
                    );
                }
                return Ok(());
            }
        }
    }
}

fn progress_bar(cli: &Cli, state: &RunState) -> Option<ProgressBar> {
    if cli.json {
        return None;
    }

    let bar = if state.max_count > 0 {
        let bar = ProgressBar::new(state.max_count as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} published")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_position(state.count as u64);
        bar
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("{} published", state.count));
        bar
    };
    bar.enable_steady_tick(Duration::from_millis(120));
    Some(bar)
}

/// Resolve a CDP endpoint string (port number or ws:// URL) and persist it
/// as the active browser session.
async fn apply_cdp_override(session: &BrowserSession, endpoint: &str) -> Result<()> {
    let (cdp_port, cdp_url) = if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        let port = endpoint
            .split("://")
            .nth(1)
            .and_then(|s| s.split('/').next())
            .and_then(|host_port| host_port.rsplit(':').next())
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(9222);
        (port, endpoint.to_string())
    } else if let Ok(port) = endpoint.parse::<u16>() {
        let version_url = format!("http://127.0.0.1:{}/json/version", port);
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let resp = client.get(&version_url).send().await.map_err(|e| {
            NotepubError::CdpConnectionFailed(format!(
                "Cannot reach CDP at port {}. Is the browser running with --remote-debugging-port={}? Error: {}",
                port, port, e
            ))
        })?;

        let version_info: serde_json::Value = resp.json().await.map_err(|e| {
            NotepubError::CdpConnectionFailed(format!("Invalid response from CDP endpoint: {}", e))
        })?;

        let ws_url = version_info
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("ws://127.0.0.1:{}", port));

        (port, ws_url)
    } else {
        return Err(NotepubError::CdpConnectionFailed(
            "Invalid endpoint. Use a port number or WebSocket URL (ws://...).".to_string(),
        ));
    };

    session.save_external_session(cdp_port, &cdp_url)?;
    tracing::debug!("CDP override applied: port={}, url={}", cdp_port, cdp_url);

    Ok(())
}
