//! CLI argument parsing tests
//!
//! These tests verify argument handling and the read-only command surfaces;
//! nothing here launches a browser.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get the notepub binary command
fn notepub() -> Command {
    Command::cargo_bin("notepub").unwrap()
}

mod help {
    use super::*;

    #[test]
    fn shows_help() {
        notepub()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("notepub"))
            .stdout(predicate::str::contains("bulk-publish"));
    }

    #[test]
    fn shows_version() {
        notepub()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("notepub"));
    }

    #[test]
    fn lists_subcommands() {
        notepub()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("stop"))
            .stdout(predicate::str::contains("status"))
            .stdout(predicate::str::contains("config"));
    }
}

mod run_command {
    use super::*;

    #[test]
    fn run_help_shows_options() {
        notepub()
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--count"))
            .stdout(predicate::str::contains("--yes"))
            .stdout(predicate::str::contains("0 = all"));
    }

    #[test]
    fn run_rejects_non_numeric_count() {
        notepub()
            .args(["run", "--count", "three"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn run_json_requires_count() {
        // Isolated HOME so no real run state can make this resume a run
        let home = tempfile::tempdir().unwrap();
        notepub()
            .env("HOME", home.path())
            .args(["--json", "run"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--count is required"));
    }
}

mod stop_command {
    use super::*;

    #[test]
    fn stop_help() {
        notepub()
            .args(["stop", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Stop the active publish run"));
    }
}

mod status_command {
    use super::*;

    #[test]
    fn status_help() {
        notepub()
            .args(["status", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("status"));
    }
}

mod config_command {
    use super::*;

    #[test]
    fn config_requires_subcommand() {
        notepub()
            .arg("config")
            .assert()
            .failure()
            .stderr(predicate::str::contains("subcommand"));
    }

    #[test]
    fn config_path_mentions_notepub() {
        notepub()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("notepub"));
    }

    #[test]
    fn config_show_prints_site_table() {
        notepub()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("draft_list_url"))
            .stdout(predicate::str::contains("note.com"));
    }

    #[test]
    fn config_get_unknown_key_fails() {
        notepub()
            .args(["config", "get", "nonsense.key"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn config_get_default_draft_list_url() {
        notepub()
            .args(["config", "get", "site.draft_list_url"])
            .assert()
            .success()
            .stdout(predicate::str::contains("status=draft"));
    }
}

mod global_flags {
    use super::*;

    #[test]
    fn json_flag_is_global() {
        notepub()
            .args(["config", "path", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"path\""));
    }
}
