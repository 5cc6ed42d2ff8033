use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{NotepubError, Result};

/// Progress of a publish run, persisted as a single JSON document.
///
/// This record is the only thing carrying progress across page navigations
/// and CLI invocations. `count` increases by exactly 1 at the single point
/// where a publish is confirmed (arrival on the post-publish article page),
/// and never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Whether an automation run is in progress
    pub active: bool,

    /// Drafts published so far in this run
    pub count: u32,

    /// Target number of drafts; 0 means unbounded ("all").
    /// Older writers omitted this field, so it defaults on load.
    #[serde(default)]
    pub max_count: u32,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            active: false,
            count: 0,
            max_count: 0,
        }
    }
}

impl RunState {
    /// Fresh state for a run targeting `max_count` drafts (0 = all)
    pub fn start(max_count: u32) -> Self {
        Self {
            active: true,
            count: 0,
            max_count,
        }
    }

    /// Record one confirmed publish
    pub fn record_publish(&mut self) {
        self.count += 1;
    }

    /// Whether the configured target has been reached
    pub fn target_reached(&self) -> bool {
        self.max_count > 0 && self.count >= self.max_count
    }

    /// Human-readable target, for prompts and notices
    pub fn target_label(&self) -> String {
        if self.max_count == 0 {
            "all drafts".to_string()
        } else {
            format!("{} draft(s)", self.max_count)
        }
    }
}

/// Disk-backed store for [`RunState`]. Read, written, and cleared as a unit;
/// a missing file reads as the idle default.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".notepub")
            .join("run_state.json");

        Self { path }
    }

    /// Store rooted at an explicit path (tests)
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<RunState> {
        if !self.path.exists() {
            return Ok(RunState::default());
        }

        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| NotepubError::StateError(format!("corrupt run state: {}", e)))
    }

    pub fn save(&self, state: &RunState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(dir: &std::path::Path) -> StateStore {
        StateStore::at(dir.join("run_state.json"))
    }

    #[test]
    fn missing_file_reads_as_idle() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let state = store.load().unwrap();
        assert!(!state.active);
        assert_eq!(state.count, 0);
        assert_eq!(state.max_count, 0);
    }

    #[test]
    fn start_initializes_run() {
        let state = RunState::start(3);

        assert!(state.active);
        assert_eq!(state.count, 0);
        assert_eq!(state.max_count, 3);
        assert!(!state.target_reached());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let state = RunState::start(5);
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn record_publish_increments_by_one() {
        let mut state = RunState::start(2);

        state.record_publish();
        assert_eq!(state.count, 1);
        assert!(!state.target_reached());

        state.record_publish();
        assert_eq!(state.count, 2);
        assert!(state.target_reached());
    }

    #[test]
    fn unbounded_target_is_never_reached() {
        let mut state = RunState::start(0);

        for _ in 0..100 {
            state.record_publish();
        }
        assert!(!state.target_reached());
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        store.save(&RunState::start(1)).unwrap();
        store.clear().unwrap();

        assert!(!store.load().unwrap().active);
    }

    #[test]
    fn clear_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        store.clear().unwrap();
    }

    #[test]
    fn max_count_defaults_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_state.json");
        std::fs::write(&path, r#"{"active": true, "count": 4}"#).unwrap();

        let state = StateStore::at(path).load().unwrap();
        assert!(state.active);
        assert_eq!(state.count, 4);
        assert_eq!(state.max_count, 0);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_state.json");
        std::fs::write(&path, "not json").unwrap();

        let result = StateStore::at(path).load();
        assert!(matches!(result, Err(NotepubError::StateError(_))));
    }

    #[test]
    fn target_labels() {
        assert_eq!(RunState::start(0).target_label(), "all drafts");
        assert_eq!(RunState::start(7).target_label(), "7 draft(s)");
    }
}
