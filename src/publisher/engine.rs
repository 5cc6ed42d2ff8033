use std::time::Duration;

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::error::{NotepubError, Result};

use super::actions::Actions;
use super::classify::{classify, Page};
use super::dom;
use super::state::StateStore;
use super::wait::await_condition;

/// Why a run ended on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    NoDraftsRemain,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::TargetReached => f.write_str("target reached"),
            StopReason::NoDraftsRemain => f.write_str("no drafts remain"),
        }
    }
}

/// Result of one state-machine cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// An in-page action ran and the page moved on; nothing to report
    Advanced,
    /// Arrival on the article page confirmed one publish
    Published { count: u32 },
    /// The run finished and state was cleared
    Complete { count: u32, reason: StopReason },
    /// Persisted state is gone or inactive (stop control was used)
    Stopped { count: u32 },
    /// The browser sits on an unrecognized page and is not moving
    Paused { url: String },
}

/// The page automator: a state machine over page roles, driven one cycle per
/// page (re)load. Each cycle re-reads persisted state, classifies the live
/// URL, performs one page-appropriate action, and waits for the transition.
pub struct Engine<'a> {
    session: &'a BrowserSession,
    store: &'a StateStore,
    config: &'a Config,
}

impl<'a> Engine<'a> {
    pub fn new(session: &'a BrowserSession, store: &'a StateStore, config: &'a Config) -> Self {
        Self {
            session,
            store,
            config,
        }
    }

    fn poll(&self) -> Duration {
        Duration::from_millis(self.config.timing.poll_interval_ms)
    }

    fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timing.nav_timeout_ms)
    }

    /// Run one cycle: settle, guard, classify, act.
    pub async fn cycle(&self) -> Result<CycleOutcome> {
        await_condition(
            self.session,
            dom::DOCUMENT_COMPLETE,
            self.nav_timeout(),
            self.poll(),
            "document load",
        )
        .await?;

        // Completion guard. State is re-read from disk every cycle so a stop
        // issued from another process takes effect here, at the next page.
        let mut state = self.store.load()?;
        if !state.active {
            return Ok(CycleOutcome::Stopped { count: state.count });
        }
        if state.target_reached() {
            self.store.clear()?;
            return Ok(CycleOutcome::Complete {
                count: state.count,
                reason: StopReason::TargetReached,
            });
        }

        let url = self.session.current_url().await?;
        let page = classify(&url);
        tracing::info!("on {} ({} published so far)", page, state.count);

        let actions = Actions::new(self.session, &self.config.site, &self.config.timing);

        match page {
            Page::DraftList => {
                if !actions.any_drafts_listed().await? {
                    self.store.clear()?;
                    return Ok(CycleOutcome::Complete {
                        count: state.count,
                        reason: StopReason::NoDraftsRemain,
                    });
                }
                actions.open_first_draft().await?;
                self.wait_for_departure(&url).await?;
                Ok(CycleOutcome::Advanced)
            }
            Page::EditPage => {
                actions.publish_draft().await?;
                self.wait_for_departure(&url).await?;
                Ok(CycleOutcome::Advanced)
            }
            Page::ArticlePage => {
                // The publish-confirmation point: the only place count changes
                state.record_publish();
                self.store.save(&state)?;
                tracing::info!("publish #{} confirmed", state.count);

                if state.target_reached() {
                    self.store.clear()?;
                    return Ok(CycleOutcome::Complete {
                        count: state.count,
                        reason: StopReason::TargetReached,
                    });
                }

                tokio::time::sleep(Duration::from_millis(self.config.timing.settle_ms)).await;
                self.session.goto(&self.config.site.draft_list_url).await?;
                // Wait the navigation out; otherwise the next cycle would
                // still see this article page and count it again.
                self.wait_for_departure(&url).await?;
                Ok(CycleOutcome::Published { count: state.count })
            }
            Page::Unknown => {
                // Safe absorbing state: take no action. Give the page a
                // bounded chance to move on its own before pausing the run.
                match self.wait_for_departure(&url).await {
                    Ok(()) => Ok(CycleOutcome::Advanced),
                    Err(NotepubError::Timeout(_)) => Ok(CycleOutcome::Paused { url }),
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Wait until the active page has left `from_url` and finished loading
    async fn wait_for_departure(&self, from_url: &str) -> Result<()> {
        let expr = format!(
            "document.location.href !== {} && document.readyState === 'complete'",
            serde_json::to_string(from_url)?
        );
        await_condition(
            self.session,
            &expr,
            self.nav_timeout(),
            self.poll(),
            "navigation",
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reasons_render_for_notices() {
        assert_eq!(StopReason::TargetReached.to_string(), "target reached");
        assert_eq!(StopReason::NoDraftsRemain.to_string(), "no drafts remain");
    }
}
