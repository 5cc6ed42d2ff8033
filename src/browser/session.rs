use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::Browser;
use chromiumoxide::handler::Handler;
use serde::{Deserialize, Serialize};

use super::launcher::BrowserLauncher;
use crate::config::BrowserConfig;
use crate::error::{NotepubError, Result};

/// Page info from CDP /json/list endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub web_socket_debugger_url: Option<String>,
}

/// Session state persisted to disk across CLI invocations
#[derive(Debug, Serialize, Deserialize)]
struct SessionState {
    cdp_port: u16,
    cdp_url: String,
}

/// One browser session shared by run/stop/status. Automation drives a single
/// page context at a time, so there is exactly one session record.
pub struct BrowserSession {
    config: BrowserConfig,
    state_dir: PathBuf,
    executable_override: Option<String>,
    headless_override: bool,
}

impl BrowserSession {
    pub fn new(config: BrowserConfig) -> Self {
        let state_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".notepub");

        Self {
            config,
            state_dir,
            executable_override: None,
            headless_override: false,
        }
    }

    /// Apply CLI-level overrides (--browser-path, --headless)
    pub fn with_overrides(mut self, executable: Option<String>, headless: bool) -> Self {
        self.executable_override = executable;
        self.headless_override = headless;
        self
    }

    fn session_file(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }

    fn load_session_state(&self) -> Option<SessionState> {
        let path = self.session_file();
        if path.exists() {
            let content = fs::read_to_string(&path).ok()?;
            serde_json::from_str(&content).ok()
        } else {
            None
        }
    }

    fn save_session_state(&self, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.state_dir)?;
        let content = serde_json::to_string_pretty(state)?;
        fs::write(self.session_file(), content)?;
        Ok(())
    }

    fn remove_session_state(&self) -> Result<()> {
        let path = self.session_file();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Save session state for an externally connected browser (via --cdp)
    pub fn save_external_session(&self, cdp_port: u16, cdp_url: &str) -> Result<()> {
        let state = SessionState {
            cdp_port,
            cdp_url: cdp_url.to_string(),
        };
        self.save_session_state(&state)
    }

    fn localhost_client(timeout: Duration) -> reqwest::Client {
        // Bypass proxy for localhost
        reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }

    /// Check if a session is still alive
    async fn is_session_alive(&self, state: &SessionState) -> bool {
        let url = format!("http://127.0.0.1:{}/json/version", state.cdp_port);
        let client = Self::localhost_client(Duration::from_secs(5));
        client.get(&url).send().await.is_ok()
    }

    /// Fetch the current browser WebSocket URL from a CDP port via /json/version.
    /// Returns `None` if the port is unreachable or the response is malformed.
    async fn fetch_browser_ws_url(&self, cdp_port: u16) -> Option<String> {
        let url = format!("http://127.0.0.1:{}/json/version", cdp_port);
        let client = Self::localhost_client(Duration::from_secs(5));
        let resp = client.get(&url).send().await.ok()?;
        let info: serde_json::Value = resp.json().await.ok()?;
        info.get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Get or create the browser session
    pub async fn ensure(&self) -> Result<(Browser, Handler)> {
        if let Some(mut state) = self.load_session_state() {
            if self.is_session_alive(&state).await {
                // Refresh WebSocket URL — the browser may have restarted on the same port,
                // which generates a new session ID and invalidates the cached URL.
                if let Some(fresh_url) = self.fetch_browser_ws_url(state.cdp_port).await {
                    if fresh_url != state.cdp_url {
                        tracing::debug!("CDP WebSocket URL changed, updating session");
                        state.cdp_url = fresh_url;
                        self.save_session_state(&state)?;
                    }
                }
                tracing::debug!("Reusing existing browser session");
                return self.connect_to_session(&state).await;
            } else {
                tracing::debug!("Browser session is dead, removing");
                self.remove_session_state()?;
            }
        }

        tracing::debug!("No existing browser found, launching a new one");
        self.create_session().await
    }

    /// Launch a new browser and record its session
    async fn create_session(&self) -> Result<(Browser, Handler)> {
        let launcher = BrowserLauncher::from_config(&self.config, self.executable_override.as_deref())?
            .headless(self.config.headless || self.headless_override);

        let (_child, cdp_url) = launcher.launch_and_wait().await?;

        let state = SessionState {
            cdp_port: launcher.get_cdp_port(),
            cdp_url: cdp_url.clone(),
        };
        self.save_session_state(&state)?;

        self.connect_to_session(&state).await
    }

    /// Connect to an existing browser session
    async fn connect_to_session(&self, state: &SessionState) -> Result<(Browser, Handler)> {
        let (browser, handler) = Browser::connect(&state.cdp_url).await.map_err(|e| {
            NotepubError::CdpConnectionFailed(format!("Failed to connect to browser: {}", e))
        })?;

        Ok((browser, handler))
    }

    /// Get list of pages from the browser
    pub async fn get_pages(&self) -> Result<Vec<PageInfo>> {
        let state = self
            .load_session_state()
            .ok_or(NotepubError::BrowserNotRunning)?;

        let url = format!("http://127.0.0.1:{}/json/list", state.cdp_port);
        let client = Self::localhost_client(Duration::from_secs(5));

        let response = client.get(&url).send().await.map_err(|e| {
            NotepubError::CdpConnectionFailed(format!("Failed to get pages: {}", e))
        })?;

        let pages: Vec<PageInfo> = response.json().await.map_err(|e| {
            NotepubError::CdpConnectionFailed(format!("Failed to parse pages: {}", e))
        })?;

        // Filter to only include actual pages (not extensions, service workers, etc.)
        Ok(pages
            .into_iter()
            .filter(|p| p.page_type == "page")
            .collect())
    }

    /// Get the active page info (first page in the list)
    pub async fn active_page(&self) -> Result<PageInfo> {
        let pages = self.get_pages().await?;
        pages
            .into_iter()
            .next()
            .ok_or(NotepubError::BrowserNotRunning)
    }

    /// Execute JavaScript on the active page using direct CDP via WebSocket
    pub async fn eval(&self, expression: &str) -> Result<serde_json::Value> {
        use futures::SinkExt;
        use tokio_tungstenite::connect_async;

        let page_info = self.active_page().await?;
        let ws_url = page_info
            .web_socket_debugger_url
            .ok_or_else(|| NotepubError::CdpConnectionFailed("No WebSocket URL".to_string()))?;

        let (mut ws, _) = connect_async(&ws_url).await.map_err(|e| {
            NotepubError::CdpConnectionFailed(format!("WebSocket connection failed: {}", e))
        })?;

        let cmd = serde_json::json!({
            "id": 1,
            "method": "Runtime.evaluate",
            "params": {
                "expression": expression,
                "returnByValue": true
            }
        });

        ws.send(tokio_tungstenite::tungstenite::Message::Text(
            cmd.to_string().into(),
        ))
        .await
        .map_err(|e| NotepubError::CdpConnectionFailed(format!("Failed to send command: {}", e)))?;

        use futures::stream::StreamExt;
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(tokio_tungstenite::tungstenite::Message::Text(text)) => {
                    let response: serde_json::Value = serde_json::from_str(text.as_str())?;
                    if response.get("id") == Some(&serde_json::json!(1)) {
                        if let Some(exception) = response
                            .get("result")
                            .and_then(|r| r.get("exceptionDetails"))
                        {
                            return Err(NotepubError::JavaScriptError(
                                exception
                                    .get("text")
                                    .and_then(|v| v.as_str())
                                    .unwrap_or("JavaScript exception")
                                    .to_string(),
                            ));
                        }
                        if let Some(result) = response.get("result").and_then(|r| r.get("result")) {
                            if let Some(value) = result.get("value") {
                                return Ok(value.clone());
                            }
                            return Ok(result.clone());
                        }
                        if let Some(error) = response.get("error") {
                            return Err(NotepubError::JavaScriptError(error.to_string()));
                        }
                        return Ok(serde_json::Value::Null);
                    }
                }
                Ok(_) => continue,
                Err(e) => {
                    return Err(NotepubError::CdpConnectionFailed(format!(
                        "WebSocket error: {}",
                        e
                    )))
                }
            }
        }

        Err(NotepubError::CdpConnectionFailed(
            "No response received".to_string(),
        ))
    }

    /// Helper to send a CDP command to the active page and get its response
    pub async fn send_cdp_command(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        use futures::SinkExt;
        use tokio_tungstenite::connect_async;

        let page_info = self.active_page().await?;
        let ws_url = page_info
            .web_socket_debugger_url
            .ok_or_else(|| NotepubError::CdpConnectionFailed("No WebSocket URL".to_string()))?;

        let (mut ws, _) = connect_async(&ws_url).await.map_err(|e| {
            NotepubError::CdpConnectionFailed(format!("WebSocket connection failed: {}", e))
        })?;

        let cmd = serde_json::json!({
            "id": 1,
            "method": method,
            "params": params
        });

        ws.send(tokio_tungstenite::tungstenite::Message::Text(
            cmd.to_string().into(),
        ))
        .await
        .map_err(|e| NotepubError::CdpConnectionFailed(format!("Failed to send command: {}", e)))?;

        use futures::stream::StreamExt;
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(tokio_tungstenite::tungstenite::Message::Text(text)) => {
                    let response: serde_json::Value = serde_json::from_str(text.as_str())?;
                    if response.get("id") == Some(&serde_json::json!(1)) {
                        if let Some(error) = response.get("error") {
                            return Err(NotepubError::Other(format!("CDP error: {}", error)));
                        }
                        return Ok(response
                            .get("result")
                            .cloned()
                            .unwrap_or(serde_json::Value::Null));
                    }
                }
                Ok(_) => continue,
                Err(e) => {
                    return Err(NotepubError::CdpConnectionFailed(format!(
                        "WebSocket error: {}",
                        e
                    )))
                }
            }
        }

        Err(NotepubError::CdpConnectionFailed(
            "No response received".to_string(),
        ))
    }

    /// Click at viewport coordinates on the active page.
    ///
    /// Move mouse to target first so the browser updates its hit-test target,
    /// then press and release. Without mouseMoved, CDP may not dispatch the
    /// click to the correct DOM element.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<()> {
        self.send_cdp_command(
            "Input.dispatchMouseEvent",
            serde_json::json!({
                "type": "mouseMoved",
                "x": x,
                "y": y
            }),
        )
        .await?;

        self.send_cdp_command(
            "Input.dispatchMouseEvent",
            serde_json::json!({
                "type": "mousePressed",
                "x": x,
                "y": y,
                "button": "left",
                "clickCount": 1
            }),
        )
        .await?;

        self.send_cdp_command(
            "Input.dispatchMouseEvent",
            serde_json::json!({
                "type": "mouseReleased",
                "x": x,
                "y": y,
                "button": "left",
                "clickCount": 1
            }),
        )
        .await?;

        Ok(())
    }

    /// Navigate the active page to a URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.send_cdp_command("Page.navigate", serde_json::json!({ "url": url }))
            .await?;
        Ok(())
    }

    /// Reload the active page
    pub async fn reload(&self) -> Result<()> {
        self.send_cdp_command("Page.reload", serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Current URL of the active page
    pub async fn current_url(&self) -> Result<String> {
        let value = self.eval("document.location.href").await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    /// Get browser session status
    pub async fn status(&self) -> SessionStatus {
        if let Some(state) = self.load_session_state() {
            if self.is_session_alive(&state).await {
                SessionStatus::Running {
                    cdp_port: state.cdp_port,
                    cdp_url: state.cdp_url,
                }
            } else {
                SessionStatus::Stale
            }
        } else {
            SessionStatus::NotRunning
        }
    }
}

#[derive(Debug)]
pub enum SessionStatus {
    Running { cdp_port: u16, cdp_url: String },
    Stale,
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a BrowserSession with a temp directory for isolation
    fn test_session(dir: &std::path::Path) -> BrowserSession {
        BrowserSession {
            config: BrowserConfig::default(),
            state_dir: dir.to_path_buf(),
            executable_override: None,
            headless_override: false,
        }
    }

    #[test]
    fn save_and_load_external_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());

        session
            .save_external_session(9222, "ws://127.0.0.1:9222/devtools/browser/abc")
            .unwrap();

        let state = session.load_session_state().unwrap();
        assert_eq!(state.cdp_port, 9222);
        assert_eq!(state.cdp_url, "ws://127.0.0.1:9222/devtools/browser/abc");
    }

    #[test]
    fn save_external_session_creates_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("nested").join("notepub");
        let session = BrowserSession {
            config: BrowserConfig::default(),
            state_dir: state_dir.clone(),
            executable_override: None,
            headless_override: false,
        };

        assert!(!state_dir.exists());
        session
            .save_external_session(9222, "ws://localhost:9222")
            .unwrap();
        assert!(state_dir.join("session.json").exists());
    }

    #[test]
    fn load_without_session_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());

        assert!(session.load_session_state().is_none());
    }

    #[test]
    fn remove_session_state_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());

        session
            .save_external_session(9222, "ws://localhost:9222")
            .unwrap();
        assert!(session.session_file().exists());

        session.remove_session_state().unwrap();
        assert!(!session.session_file().exists());
    }

    #[test]
    fn remove_nonexistent_session_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());

        session.remove_session_state().unwrap();
    }

    #[test]
    fn save_overwrites_existing_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());

        session
            .save_external_session(9222, "ws://old-url")
            .unwrap();
        session
            .save_external_session(9333, "ws://new-url")
            .unwrap();

        let state = session.load_session_state().unwrap();
        assert_eq!(state.cdp_port, 9333);
        assert_eq!(state.cdp_url, "ws://new-url");
    }

    #[tokio::test]
    async fn dead_session_reports_stale() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());

        // Save a session pointing to a port nothing is listening on
        session
            .save_external_session(19999, "ws://127.0.0.1:19999")
            .unwrap();

        let status = session.status().await;
        assert!(matches!(status, SessionStatus::Stale));
    }

    #[tokio::test]
    async fn no_session_reports_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());

        let status = session.status().await;
        assert!(matches!(status, SessionStatus::NotRunning));
    }

    #[tokio::test]
    async fn fetch_browser_ws_url_returns_none_for_unreachable_port() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());

        let result = session.fetch_browser_ws_url(19998).await;
        assert!(result.is_none());
    }
}
