use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{NotepubError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Target-site surface (URLs, selectors, labels)
    #[serde(default)]
    pub site: SiteConfig,

    /// Wait and settle tuning
    #[serde(default)]
    pub timing: TimingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            site: SiteConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Browser executable path (overrides auto-discovery)
    pub executable: Option<String>,

    /// CDP port the launched browser listens on
    #[serde(default = "default_cdp_port")]
    pub cdp_port: u16,

    /// User data directory (isolated profile by default)
    pub user_data_dir: Option<String>,

    /// Headless mode
    #[serde(default)]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            cdp_port: default_cdp_port(),
            user_data_dir: None,
            headless: false,
        }
    }
}

fn default_cdp_port() -> u16 {
    9222
}

/// Everything notepub knows about note.com's markup lives here, so UI drift
/// is a config edit rather than a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Draft list URL the loop returns to after each publish
    #[serde(default = "default_draft_list_url")]
    pub draft_list_url: String,

    /// Candidate selectors for the first draft's overflow ("...") control,
    /// in priority order; first match wins
    #[serde(default = "default_overflow_selectors")]
    pub overflow_selectors: Vec<String>,

    /// Selectors scoping the balloon popup menu buttons
    #[serde(default = "default_balloon_selectors")]
    pub balloon_selectors: Vec<String>,

    /// Exact label of the balloon menu's edit entry
    #[serde(default = "default_edit_label")]
    pub edit_label: String,

    /// Exact label of the editor's proceed-to-publish button
    #[serde(default = "default_publish_label")]
    pub publish_label: String,

    /// Accepted exact labels of the final post button
    #[serde(default = "default_post_labels")]
    pub post_labels: Vec<String>,

    /// Candidate selectors for the share dialog's close control
    #[serde(default = "default_close_selectors")]
    pub close_selectors: Vec<String>,

    /// Broad content-card selectors used by the no-drafts-remain guard
    #[serde(default = "default_card_selectors")]
    pub card_selectors: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            draft_list_url: default_draft_list_url(),
            overflow_selectors: default_overflow_selectors(),
            balloon_selectors: default_balloon_selectors(),
            edit_label: default_edit_label(),
            publish_label: default_publish_label(),
            post_labels: default_post_labels(),
            close_selectors: default_close_selectors(),
            card_selectors: default_card_selectors(),
        }
    }
}

fn default_draft_list_url() -> String {
    "https://note.com/notes?status=draft".to_string()
}

fn default_overflow_selectors() -> Vec<String> {
    vec![
        "button.o-articleList__more".to_string(),
        "button[aria-label=\"その他\"]".to_string(),
        ".o-articleList__others button".to_string(),
    ]
}

fn default_balloon_selectors() -> Vec<String> {
    vec![
        "button.m-basicBalloonList__button".to_string(),
        ".m-basicBalloonList__item button".to_string(),
    ]
}

fn default_edit_label() -> String {
    "編集".to_string()
}

fn default_publish_label() -> String {
    "公開に進む".to_string()
}

fn default_post_labels() -> Vec<String> {
    vec!["投稿する".to_string(), "投稿".to_string()]
}

fn default_close_selectors() -> Vec<String> {
    vec![
        "button[aria-label*=\"閉じる\"]".to_string(),
        "button[aria-label*=\"close\"]".to_string(),
        "[class*=\"close\"] button".to_string(),
        "button:has(svg)".to_string(),
    ]
}

fn default_card_selectors() -> Vec<String> {
    vec![
        "[class*=\"article\"]".to_string(),
        "[class*=\"note\"]".to_string(),
        "[class*=\"item\"]".to_string(),
        "[class*=\"card\"]".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause after a click before the next lookup (ms)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Bound on element-appearance waits (ms)
    #[serde(default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,

    /// Bound on the editor's proceed-button wait; the editor loads slowly (ms)
    #[serde(default = "default_editor_timeout_ms")]
    pub editor_timeout_ms: u64,

    /// Bound on full-page navigation waits (ms)
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,

    /// Readiness-poll interval (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            element_timeout_ms: default_element_timeout_ms(),
            editor_timeout_ms: default_editor_timeout_ms(),
            nav_timeout_ms: default_nav_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_element_timeout_ms() -> u64 {
    10_000
}

fn default_editor_timeout_ms() -> u64 {
    15_000
}

fn default_nav_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Config {
    /// Load configuration from all sources (file, env, defaults)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Merge config file if exists
            .merge(Toml::file(&config_path))
            // Merge environment variables (NOTEPUB_*)
            .merge(Env::prefixed("NOTEPUB_").split("_"))
            .extract()
            .map_err(|e| NotepubError::ConfigError(e.to_string()))?;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notepub")
            .join("config.toml")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| NotepubError::ConfigError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_site_targets_draft_list() {
        let config = Config::default();

        assert_eq!(config.site.draft_list_url, "https://note.com/notes?status=draft");
        assert!(!config.site.overflow_selectors.is_empty());
        assert_eq!(config.site.overflow_selectors[0], "button.o-articleList__more");
    }

    #[test]
    fn default_post_labels_accept_both_literals() {
        let config = Config::default();

        assert_eq!(config.site.post_labels, vec!["投稿する", "投稿"]);
    }

    #[test]
    fn default_timing_bounds_are_nonzero() {
        let timing = TimingConfig::default();

        assert!(timing.element_timeout_ms > 0);
        assert!(timing.editor_timeout_ms >= timing.element_timeout_ms);
        assert!(timing.poll_interval_ms > 0);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.site.edit_label, config.site.edit_label);
        assert_eq!(parsed.browser.cdp_port, config.browser.cdp_port);
        assert_eq!(parsed.timing.settle_ms, config.timing.settle_ms);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[browser]\nheadless = true\n").unwrap();

        assert!(parsed.browser.headless);
        assert_eq!(parsed.browser.cdp_port, 9222);
        assert_eq!(parsed.site.edit_label, "編集");
    }
}
