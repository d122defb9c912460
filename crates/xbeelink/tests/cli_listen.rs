#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

// Data frame from 0013A2004127CE89 carrying a manual-valve record, then a modem status.
const CAPTURE: [u8; 24] = [
    0x7E, 0x00, 0x0E, 0x90, 0x00, 0x13, 0xA2, 0x00, 0x41, 0x27, 0xCE, 0x89, 0xFF, 0xFE, 0x01,
    0x02, 0x01, 0xFA, 0x7E, 0x00, 0x02, 0x8A, 0x02, 0x73,
];

fn capture_file(tag: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "xbeelink-cli-{tag}-{}.bin",
        std::process::id()
    ));
    std::fs::write(&path, bytes).expect("capture should be writable");
    path
}

#[test]
fn listen_replays_capture_through_bridge() {
    let path = capture_file("replay", &CAPTURE);
    let output = Command::new(env!("CARGO_BIN_EXE_xbeelink"))
        .args(["--format", "json", "listen", "--capture"])
        .arg(&path)
        .output()
        .expect("listen should run");
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(0));
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["kind"], "publish");
    assert_eq!(
        lines[0]["topic"],
        "/tele/TankWaterer/0013A2004127CE89/manual"
    );
    assert_eq!(lines[0]["payload"]["ValveOpen"], true);
    assert_eq!(lines[1]["kind"], "modem");
    assert_eq!(lines[1]["status"], 2);
}

#[test]
fn listen_honours_count_and_prefix() {
    let path = capture_file("count", &CAPTURE);
    let output = Command::new(env!("CARGO_BIN_EXE_xbeelink"))
        .args([
            "--format",
            "raw",
            "listen",
            "--count",
            "1",
            "--telemetry-prefix",
            "home/tele",
            "--capture",
        ])
        .arg(&path)
        .output()
        .expect("listen should run");
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"ValveOpen":true}"#
    );
}

#[test]
fn listen_missing_capture_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_xbeelink"))
        .args(["listen", "--capture", "/nonexistent/xbeelink.bin"])
        .output()
        .expect("listen should run");
    assert_eq!(output.status.code(), Some(3));
}
