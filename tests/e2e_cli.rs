//! CLI end-to-end tests.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

#[allow(deprecated)]
fn mediasplit_cmd() -> Command {
    let mut cmd = Command::cargo_bin("mediasplit").unwrap();
    // Keep the developer's environment from leaking into assertions.
    for var in [
        "MEDIASPLIT_HOST",
        "MEDIASPLIT_PORT",
        "MEDIASPLIT_BASE_URL",
        "MEDIASPLIT_BASE_PATH",
        "MEDIASPLIT_STORAGE_DIR",
        "MEDIASPLIT_FFMPEG_PATH",
        "MEDIASPLIT_FFPROBE_PATH",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_config(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn no_args_shows_help() {
    mediasplit_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    mediasplit_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediasplit"))
        .stdout(predicate::str::contains("split"));
}

#[test]
fn version_flag_and_command() {
    mediasplit_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediasplit"));

    mediasplit_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn start_help() {
    mediasplit_cmd()
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"));
}

#[test]
fn check_tools_lists_ffmpeg_and_ffprobe() {
    mediasplit_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn validate_defaults() {
    mediasplit_cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("0.0.0.0:8080"));
}

#[test]
fn validate_config_file_reports_warnings() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{
            "server": { "port": 9001, "base_url": "https://media.example.com", "base_path": "api" },
            "retention": { "max_age_hours": 1, "sweep_interval_hours": 6 }
        }"#,
    );

    mediasplit_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains(":9001"))
        .stdout(predicate::str::contains("should start with '/'"))
        .stdout(predicate::str::contains("exceeds max_age_hours"));
}

#[test]
fn validate_rejects_malformed_json() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "{ not json");

    mediasplit_cmd()
        .args(["validate"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn sweep_keeps_fresh_files() {
    let dir = tempdir().unwrap();
    let storage = dir.path().join("store");
    fs::create_dir(&storage).unwrap();
    fs::write(storage.join("20250101000000_abcdef12_000.mp4"), b"x").unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            r#"{{ "storage": {{ "root": {:?}, "subdir": null }} }}"#,
            storage.to_string_lossy()
        ),
    );

    mediasplit_cmd()
        .arg("--config")
        .arg(&config)
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("Swept 0 entries"));

    assert!(storage.join("20250101000000_abcdef12_000.mp4").exists());
}

#[test]
fn sweep_missing_storage_is_noop() {
    let dir = tempdir().unwrap();
    mediasplit_cmd()
        .env("MEDIASPLIT_STORAGE_DIR", dir.path().join("absent"))
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("Swept 0 entries"));
}

#[test]
fn split_missing_file_fails() {
    mediasplit_cmd()
        .args(["split", "/nonexistent/input.mp4", "--size", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn probe_missing_file_fails() {
    mediasplit_cmd()
        .args(["probe", "/nonexistent/input.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[cfg(unix)]
#[test]
fn probe_json_with_stand_in_ffprobe() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let ffprobe = dir.path().join("ffprobe");
    fs::write(&ffprobe, "#!/bin/sh\nprintf '100.0\\n100000000\\n'\n").unwrap();
    fs::set_permissions(&ffprobe, fs::Permissions::from_mode(0o755)).unwrap();
    let media = dir.path().join("clip.mp4");
    fs::write(&media, b"x").unwrap();

    let output = mediasplit_cmd()
        .env("MEDIASPLIT_FFPROBE_PATH", &ffprobe)
        .args(["probe", "--json", "--size", "25"])
        .arg(&media)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["bitrate"], 8_000_000.0);
    assert_eq!(report["target_size_mb"], 25);
    assert_eq!(report["plan"]["is_fallback"], false);
    let secs = report["plan"]["segment_secs"].as_f64().unwrap();
    assert!((secs - 26.2144).abs() < 1e-9);
}

#[test]
fn rust_log_from_dotenv_sets_filter() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".env"), "RUST_LOG=mediasplit=debug\n").unwrap();

    mediasplit_cmd()
        .current_dir(dir.path())
        .arg("version")
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded environment from"));
}
