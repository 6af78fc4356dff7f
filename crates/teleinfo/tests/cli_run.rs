#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run_simulated(flush: &str, extra: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_teleinfo"))
        .args(["--log-level", "error", "--format", "json", "run"])
        .arg("--simulate-consumption")
        .arg(fixture("consumption.bin"))
        .arg("--simulate-production")
        .arg(fixture("production.bin"))
        .args([
            "--publish",
            "stdout",
            "--line-interval",
            "1ms",
            "--flush",
            flush,
            "--scan-timeout",
            "3s",
        ])
        .args(extra)
        .output()
        .expect("run should start")
}

#[test]
fn one_cycle_publishes_both_channels_in_order() {
    let output = run_simulated("50ms", &["--cycles", "1"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "stdout: {stdout}");
    assert!(lines[0].starts_with(r#"{"TYPE":"CONSOMMATION","DATE":"#));
    assert!(lines[1].starts_with(r#"{"TYPE":"PRODUCTION","DATE":"#));

    let conso: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
    assert_eq!(conso["SINSTS"], "00290");
    assert_eq!(conso["SMAXSN1"], "E210615115407 07200");
    assert_eq!(conso["MSG1"], "PAS DE MESSAGE");
    assert_eq!(conso["NGTF"], "TEMPO");
    assert_eq!(conso["EASF02"], "002117322");
    assert!(conso.get("ADSC").is_none());

    let prod: serde_json::Value = serde_json::from_str(lines[1]).expect("json line");
    assert_eq!(prod["SINSTI"], "00000");
    assert_eq!(prod["EAIT"], "000120000");
    assert_eq!(prod["SMAXIN1"], "E210615120000 02000");
    assert!(prod.get("SINSTS").is_none());
}

#[test]
fn crosstalk_after_switch_is_flushed() {
    let output = run_simulated(
        "300ms",
        &["--cycles", "2", "--interval", "10ms", "--crosstalk", "3"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let snapshots: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(snapshots.len(), 4);
    for snap in snapshots.iter().filter(|s| s["TYPE"] == "PRODUCTION") {
        assert_eq!(snap["PRM"], "12345678901235");
    }
    for snap in snapshots.iter().filter(|s| s["TYPE"] == "CONSOMMATION") {
        assert_eq!(snap["PRM"], "12345678901234");
    }
}

#[test]
fn run_without_device_is_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_teleinfo"))
        .args(["--log-level", "error", "run", "--publish", "stdout"])
        .env_remove("TELEINFO_DEVICE")
        .output()
        .expect("run should start");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_teleinfo"))
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("teleinfo {}", env!("CARGO_PKG_VERSION"))
    );
}
