use std::time::Duration;

use crate::browser::BrowserSession;
use crate::config::{SiteConfig, TimingConfig};
use crate::error::{NotepubError, Result};

use super::dom;
use super::wait::await_condition;

/// An expired appearance wait means the required element never showed up
fn not_found_on_timeout(what: &'static str) -> impl FnOnce(NotepubError) -> NotepubError {
    move |e| match e {
        NotepubError::Timeout(_) => NotepubError::ElementNotFound(what.to_string()),
        other => other,
    }
}

/// Page-appropriate UI actions, one handler per page role.
///
/// Every lookup that finds no target fails the current action immediately;
/// there are no retries. Appearance waits are bounded by the timing config.
pub struct Actions<'a> {
    session: &'a BrowserSession,
    site: &'a SiteConfig,
    timing: &'a TimingConfig,
}

impl<'a> Actions<'a> {
    pub fn new(session: &'a BrowserSession, site: &'a SiteConfig, timing: &'a TimingConfig) -> Self {
        Self {
            session,
            site,
            timing,
        }
    }

    fn settle(&self) -> Duration {
        Duration::from_millis(self.timing.settle_ms)
    }

    fn poll(&self) -> Duration {
        Duration::from_millis(self.timing.poll_interval_ms)
    }

    fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.timing.element_timeout_ms)
    }

    async fn click(&self, target: &serde_json::Value, what: &str) -> Result<()> {
        let (x, y) = dom::coords_of(target)
            .ok_or_else(|| NotepubError::Other(format!("Invalid coordinates for {}", what)))?;
        tracing::debug!("clicking {} at ({:.0}, {:.0})", what, x, y);
        self.session.click_at(x, y).await
    }

    /// Whether the draft list shows any content cards. Times out to `false`:
    /// a list that never renders cards has no drafts remaining.
    pub async fn any_drafts_listed(&self) -> Result<bool> {
        let expr = format!("{} > 0", dom::card_count(&self.site.card_selectors));
        match await_condition(
            self.session,
            &expr,
            self.element_timeout(),
            self.poll(),
            "draft list content",
        )
        .await
        {
            Ok(_) => Ok(true),
            Err(NotepubError::Timeout(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Draft list: open the first draft's overflow menu, then click the
    /// balloon menu's edit entry. Ends with navigation to the edit page.
    pub async fn open_first_draft(&self) -> Result<()> {
        let found = self
            .session
            .eval(&dom::first_match_coords(&self.site.overflow_selectors))
            .await?;
        if found.is_null() {
            return Err(NotepubError::ElementNotFound(
                "draft overflow control (no drafts listed, or the list markup changed)".to_string(),
            ));
        }
        if let Some(selector) = found.get("selector").and_then(|v| v.as_str()) {
            tracing::debug!("overflow control matched selector {:?}", selector);
        }
        self.click(&found, "overflow control").await?;

        // The balloon menu renders after the click
        tokio::time::sleep(self.settle()).await;
        let edit_js = dom::labeled_button_coords(
            &self.site.balloon_selectors.join(", "),
            std::slice::from_ref(&self.site.edit_label),
        );
        let edit = await_condition(
            self.session,
            &edit_js,
            self.element_timeout(),
            self.poll(),
            "edit menu entry",
        )
        .await
        .map_err(not_found_on_timeout("edit menu entry"))?;
        self.click(&edit, "edit menu entry").await?;

        Ok(())
    }

    /// Edit page: proceed to publish, confirm the post, close the share
    /// dialog. Ends with navigation to the published article.
    pub async fn publish_draft(&self) -> Result<()> {
        // The editor is slow to load; wait for its button rather than sleeping
        let publish_js = dom::labeled_button_coords(
            "button",
            std::slice::from_ref(&self.site.publish_label),
        );
        let publish = await_condition(
            self.session,
            &publish_js,
            Duration::from_millis(self.timing.editor_timeout_ms),
            self.poll(),
            "proceed-to-publish button",
        )
        .await
        .map_err(not_found_on_timeout("proceed-to-publish button"))?;
        self.click(&publish, "proceed-to-publish button").await?;

        tokio::time::sleep(self.settle()).await;
        let post_js = dom::labeled_button_coords("button", &self.site.post_labels);
        let post = await_condition(
            self.session,
            &post_js,
            self.element_timeout(),
            self.poll(),
            "post button",
        )
        .await
        .map_err(not_found_on_timeout("post button"))?;
        self.click(&post, "post button").await?;

        tokio::time::sleep(self.settle()).await;
        self.close_share_dialog().await
    }

    /// The share dialog appears once the post is confirmed; its close button
    /// sits in the page's top-right region. Closing it triggers navigation.
    async fn close_share_dialog(&self) -> Result<()> {
        let close_js = dom::close_control_coords(&self.site.close_selectors);
        let close = await_condition(
            self.session,
            &close_js,
            self.element_timeout(),
            self.poll(),
            "share dialog close control",
        )
        .await
        .map_err(not_found_on_timeout("share dialog close control"))?;
        self.click(&close, "share dialog close control").await?;

        Ok(())
    }
}
