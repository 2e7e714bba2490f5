//! CLI integration tests for the Concord command-line interface.
//!
//! These tests never reach the network. They cover argument parsing, config
//! loading failures, and the commands that work offline (`url`, `inspect`).

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the concord binary, isolated from the host config.
fn concord(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("concord").unwrap();
    cmd.env("CONCORD_CONFIG_DIR", config_dir)
        .env_remove("CONCORD_CONFIG")
        .env_remove("CONCORD_CLIENT_SECRET")
        .env_remove("CONCORD_SIGNING_SECRET")
        .env_remove("CONCORD_BOT_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Write a complete config file and return its path.
fn write_config(dir: &TempDir, extra: &str) -> std::path::PathBuf {
    let path = dir.path().join("concord.toml");
    let contents = format!(
        "client_id = \"1234\"\n\
         client_secret = \"app-secret\"\n\
         signing_secret = \"signing-key\"\n\
         redirect_uri = \"https://example.com/callback\"\n\
         scopes = [\"identify\", \"guilds\"]\n\
         {}",
        extra
    );
    std::fs::write(&path, contents).unwrap();
    path
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    concord(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Concord"))
        .stdout(predicate::str::contains("Discord OAuth2 identity broker"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    concord(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("concord"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    concord(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("url"))
        .stdout(predicate::str::contains("exchange"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("revoke"))
        .stdout(predicate::str::contains("user"))
        .stdout(predicate::str::contains("guilds"))
        .stdout(predicate::str::contains("connections"))
        .stdout(predicate::str::contains("join"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_user_help_shows_no_cache() {
    let dir = TempDir::new().unwrap();
    concord(dir.path())
        .args(["user", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-cache"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    concord(dir.path()).arg("frobnicate").assert().failure();
}

#[test]
fn test_exchange_requires_code() {
    let dir = TempDir::new().unwrap();
    concord(dir.path())
        .arg("exchange")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<CODE>"));
}

#[test]
fn test_join_requires_guild_id() {
    let dir = TempDir::new().unwrap();
    concord(dir.path())
        .args(["join", "some-token"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<GUILD_ID>"));
}

#[test]
fn test_state_conflicts_with_no_state() {
    let dir = TempDir::new().unwrap();
    concord(dir.path())
        .args(["url", "--state", "abc", "--no-state"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Loading Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    concord(dir.path())
        .args(["--config", "/nonexistent/concord.toml", "url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_incomplete_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("concord.toml");
    std::fs::write(&path, "client_id = \"1234\"\nclient_secret = \"s\"\n").unwrap();

    concord(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("signing_secret"));
}

#[test]
fn test_secret_from_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("concord.toml");
    std::fs::write(
        &path,
        "client_id = \"1234\"\nclient_secret = \"s\"\nredirect_uri = \"https://example.com/cb\"\n",
    )
    .unwrap();

    concord(dir.path())
        .env("CONCORD_SIGNING_SECRET", "from-env")
        .arg("--config")
        .arg(&path)
        .args(["url", "--no-state"])
        .assert()
        .success()
        .stdout(predicate::str::contains("client_id=1234"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Offline Command Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_url_prints_authorization_url() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    concord(dir.path())
        .arg("--config")
        .arg(&path)
        .args(["url", "--state", "xyz"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "https://discord.com/api/v10/oauth2/authorize?",
        ))
        .stdout(predicate::str::contains("client_id=1234"))
        .stdout(predicate::str::contains("scope=identify%20guilds"))
        .stdout(predicate::str::contains("response_type=code"))
        .stdout(predicate::str::contains(
            "redirect_uri=https%3A%2F%2Fexample.com%2Fcallback",
        ))
        .stdout(predicate::str::contains("state=xyz"));
}

#[test]
fn test_url_without_state() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    concord(dir.path())
        .arg("--config")
        .arg(&path)
        .args(["url", "--no-state"])
        .assert()
        .success()
        .stdout(predicate::str::contains("state=").not());
}

#[test]
fn test_url_scope_override_drops_unknown() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    concord(dir.path())
        .arg("--config")
        .arg(&path)
        .args(["url", "--no-state", "--scopes", "identify,made_up_scope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scope=identify&"))
        .stdout(predicate::str::contains("made_up_scope").not());
}

#[test]
fn test_url_json_output() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let output = concord(dir.path())
        .arg("--config")
        .arg(&path)
        .args(["--json", "url"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["scopes"], "identify guilds");
    let state = json["state"].as_str().unwrap();
    assert_eq!(state.len(), 43);
    assert!(json["url"].as_str().unwrap().contains(state));
}

#[test]
fn test_url_requires_redirect_uri() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("concord.toml");
    std::fs::write(
        &path,
        "client_id = \"1234\"\nclient_secret = \"s\"\nsigning_secret = \"k\"\n",
    )
    .unwrap();

    concord(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("redirect_uri"));
}

#[test]
fn test_inspect_rejects_forged_token() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    concord(dir.path())
        .arg("--config")
        .arg(&path)
        .args(["inspect", "not.a-real-token"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid token"));
}
