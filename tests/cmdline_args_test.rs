//! Tests for the command-line interfaces of both binaries

use std::process::Command;
#[cfg(unix)]
use std::process::Stdio;
#[cfg(unix)]
use std::thread;
#[cfg(unix)]
use std::time::Duration;

fn help_text(binary: &str) -> String {
    let output = Command::new(binary)
        .arg("--help")
        .output()
        .expect("Failed to execute binary");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_tracker_help_lists_options() {
    let help = help_text(env!("CARGO_BIN_EXE_eye-tracker"));
    for option in ["--record", "--config", "--mirrored", "--debug", "[SOURCE]"] {
        assert!(help.contains(option), "missing {option} in:\n{help}");
    }
}

#[test]
fn test_display_help_lists_options() {
    let help = help_text(env!("CARGO_BIN_EXE_eye-display"));
    for option in ["--left", "--right", "--no-idle", "--config", "--debug"] {
        assert!(help.contains(option), "missing {option} in:\n{help}");
    }
}

#[test]
fn test_display_rejects_both_eyes() {
    let output = Command::new(env!("CARGO_BIN_EXE_eye-display"))
        .args(["--left", "--right"])
        .output()
        .expect("Failed to execute binary");
    assert!(!output.status.success());
}

#[test]
fn test_tracker_rejects_unknown_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_eye-tracker"))
        .arg("--frobnicate")
        .output()
        .expect("Failed to execute binary");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--frobnicate"));
}

#[cfg(unix)]
#[test]
fn test_display_stops_cleanly_on_sigterm() {
    use animatronic_eyes::config::Config;

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("display.yaml");
    let mut config = Config::default();
    config.transport.port = 45468;
    config.to_file(&config_path).unwrap();

    let child = Command::new(env!("CARGO_BIN_EXE_eye-display"))
        .arg("--no-idle")
        .arg("--config")
        .arg(&config_path)
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute binary");

    // Give the binary time to install its signal handler
    thread::sleep(Duration::from_millis(500));
    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .expect("Failed to run kill");
    assert!(status.success());

    let output = child.wait_with_output().expect("Failed to wait for binary");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "exit status {:?}:\n{stderr}", output.status);
    assert!(stderr.contains("Display shut down"), "missing shutdown log in:\n{stderr}");
}
