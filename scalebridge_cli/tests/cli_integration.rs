use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use assert_cmd::Command;
use tempfile::tempdir;

// Minimal valid config: no websocket, audit log inside the temp dir
fn write_valid_config(dir: &Path) -> PathBuf {
    let audit = dir.join("transactions.log");
    let toml = format!(
        r#"
[serial]
port = "/dev/null-scale"
baud_rate = 9600

[websocket]
enabled = false

[scale]
stability_threshold_kg = 0.01
stability_readings = 3
duplicate_timeout_ms = 2000

[link]
idle_ms = 1

[audit]
file = "{}"

[plu_prices]
"0002" = 1250.0
"#,
        audit.display()
    );
    let path = dir.join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn cmd(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("scalebridge_cli").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "config ok", "stdout")]
#[case(&["self-check"], 0, "prices: 6 products", "stdout")]
#[case(&["recent"], 0, "", "stdout")]
#[case(&["run", "--max-events", "nope"], 2, "invalid value", "stderr")]
#[case(&["frobnicate"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());

    let assert = cmd(&cfg).args(args).assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
#[case("[scale]\nstability_readings = 0\n", "stability_readings")]
#[case("[serial]\nbaud_rate = 0\n", "baud_rate")]
#[case("[plu_prices]\n\"0001\" = -5.0\n", "plu_prices")]
#[case("not toml at all [", "parse config")]
fn self_check_rejects_bad_config(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, toml).unwrap();

    cmd(&path)
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn self_check_json_reports_effective_settings() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    let out = cmd(&cfg).args(["--json", "self-check"]).output().unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["websocket"]["enabled"], false);
    assert_eq!(v["plu_prices"]["0002"], 1250.0);
    assert_eq!(v["plu_prices"]["0005"], 950.0);
}

#[test]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let out = cmd(&missing).args(["--json", "self-check"]).output().unwrap();
    assert_eq!(out.status.code(), Some(3));
    let line = String::from_utf8(out.stderr).unwrap();
    let last = line.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["reason"], "Config");
    assert_eq!(v["exit_code"], 3);
}

#[rstest]
#[case::threaded(&[])]
#[case::direct(&["--direct"])]
fn simulated_run_writes_audit_log(#[case] extra: &[&str]) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());

    cmd(&cfg)
        .args(["run", "--simulate", "--max-events", "2", "--sim-interval-ms", "1"])
        .args(extra)
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped after 2 weighings"));

    let out = cmd(&cfg).args(["recent", "--count", "5"]).output().unwrap();
    assert!(out.status.success());
    let lines: Vec<serde_json::Value> = String::from_utf8(out.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    // device-printed price wins for the first placement
    assert_eq!(lines[0]["product_id"], "0001");
    assert_eq!(lines[0]["weight"], 1.234);
    assert_eq!(lines[0]["unit_price"], 900.0);
    assert_eq!(lines[0]["total_price"], 1110.6);

    // table price, overridden by the config
    assert_eq!(lines[1]["product_id"], "0002");
    assert_eq!(lines[1]["weight"], 0.75);
    assert_eq!(lines[1]["unit_price"], 1250.0);
    assert_eq!(lines[1]["total_price"], 937.5);
}

#[test]
fn missing_config_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let mut c = Command::cargo_bin("scalebridge_cli").unwrap();
    c.current_dir(dir.path())
        .args(["--config", "nope.toml", "run", "--simulate", "--no-websocket"])
        .args(["--max-events", "1", "--sim-interval-ms", "1"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stderr(predicate::str::contains("using built-in defaults"));
    assert!(dir.path().join("transactions.log").exists());
}

#[test]
fn recent_limits_output() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    cmd(&cfg)
        .args(["run", "--simulate", "--max-events", "3", "--sim-interval-ms", "1"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success();

    let out = cmd(&cfg).args(["recent", "--count", "1"]).output().unwrap();
    let text = String::from_utf8(out.stdout).unwrap();
    assert_eq!(text.lines().count(), 1);
    // third placement is printed as a bare weight: no product, no price
    assert!(text.contains("\"product_id\":\"0000\""));
    assert!(text.contains("\"weight\":2.5"));
    assert!(text.contains("\"total_price\":0.0"));
}

#[cfg(not(feature = "hardware"))]
#[test]
fn serial_run_without_hardware_support_explains_itself() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    cmd(&cfg)
        .args(["run", "--max-events", "1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--simulate"));
}
