use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tokio::time::sleep;

use super::discovery::{discover_browser, BrowserInfo, BrowserType};
use crate::config::BrowserConfig;
use crate::error::{NotepubError, Result};

/// Browser launcher that starts a browser with CDP enabled
pub struct BrowserLauncher {
    browser_info: BrowserInfo,
    cdp_port: u16,
    headless: bool,
    user_data_dir: PathBuf,
}

impl BrowserLauncher {
    /// Create a launcher from the browser configuration, honoring an
    /// explicit executable override from the CLI when present.
    pub fn from_config(config: &BrowserConfig, executable: Option<&str>) -> Result<Self> {
        let browser_info = match executable.or(config.executable.as_deref()) {
            Some(path) => {
                let path = PathBuf::from(shellexpand::tilde(path).to_string());
                if !path.exists() {
                    return Err(NotepubError::BrowserLaunchFailed(format!(
                        "Browser not found at: {:?}",
                        path
                    )));
                }
                // Assume Chrome-compatible
                BrowserInfo::new(BrowserType::Chrome, path)
            }
            None => discover_browser()?,
        };

        let user_data_dir = match config.user_data_dir.as_deref() {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).to_string()),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("notepub")
                .join("profile"),
        };

        Ok(Self {
            browser_info,
            cdp_port: config.cdp_port,
            headless: config.headless,
            user_data_dir,
        })
    }

    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Build the browser launch arguments
    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.cdp_port),
            format!("--user-data-dir={}", self.user_data_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-infobars".to_string(),
            "--window-size=1280,900".to_string(),
            "--disable-save-password-bubble".to_string(),
            "--disable-translate".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
        }

        args
    }

    /// Launch the browser and return the process handle
    pub fn launch(&self) -> Result<Child> {
        // Ensure user data directory exists
        std::fs::create_dir_all(&self.user_data_dir)?;

        let args = self.build_args();

        tracing::debug!(
            "Launching browser: {:?} with args: {:?}",
            self.browser_info.path,
            args
        );

        let child = Command::new(&self.browser_info.path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                NotepubError::BrowserLaunchFailed(format!(
                    "Failed to launch {}: {}",
                    self.browser_info.browser_type.name(),
                    e
                ))
            })?;

        Ok(child)
    }

    /// Launch the browser and wait for CDP to be ready
    pub async fn launch_and_wait(&self) -> Result<(Child, String)> {
        let child = self.launch()?;
        let cdp_url = self.wait_for_cdp().await?;
        Ok((child, cdp_url))
    }

    /// Wait for CDP endpoint to be ready
    async fn wait_for_cdp(&self) -> Result<String> {
        let url = format!("http://127.0.0.1:{}/json/version", self.cdp_port);

        // Build client with NO_PROXY for localhost
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        // Try for up to 10 seconds
        for i in 0..20 {
            sleep(Duration::from_millis(500)).await;

            match client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    let json: serde_json::Value = response.json().await.map_err(|e| {
                        NotepubError::CdpConnectionFailed(format!(
                            "Failed to parse CDP response: {}",
                            e
                        ))
                    })?;

                    if let Some(ws_url) = json.get("webSocketDebuggerUrl").and_then(|v| v.as_str())
                    {
                        tracing::info!("CDP ready at: {}", ws_url);
                        return Ok(ws_url.to_string());
                    }
                }
                Ok(_) => {
                    tracing::debug!("CDP not ready yet (attempt {})", i + 1);
                }
                Err(e) => {
                    tracing::debug!("CDP connection attempt {} failed: {}", i + 1, e);
                }
            }
        }

        Err(NotepubError::CdpConnectionFailed(
            "Timeout waiting for CDP to be ready".to_string(),
        ))
    }

    /// Get CDP port
    pub fn get_cdp_port(&self) -> u16 {
        self.cdp_port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_rejects_missing_executable() {
        let config = BrowserConfig {
            executable: Some("/nonexistent/browser/binary".to_string()),
            ..Default::default()
        };

        let result = BrowserLauncher::from_config(&config, None);
        assert!(matches!(
            result,
            Err(NotepubError::BrowserLaunchFailed(_))
        ));
    }

    #[test]
    fn cli_override_takes_precedence_over_config() {
        let config = BrowserConfig {
            executable: Some("/also/nonexistent".to_string()),
            ..Default::default()
        };

        // The override path is checked first, so the error mentions it
        let result = BrowserLauncher::from_config(&config, Some("/override/nonexistent"));
        match result {
            Err(NotepubError::BrowserLaunchFailed(msg)) => {
                assert!(msg.contains("/override/nonexistent"));
            }
            _ => panic!("expected launch failure for missing override path"),
        }
    }
}
