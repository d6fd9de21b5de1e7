use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "edsim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const SINGLE_DESK: &str = r#"
{
    "schema_version": 1,
    "name": "single desk",
    "horizon_minutes": 100,
    "arrival": { "kind": "deterministic", "value": 10 },
    "resources": [ { "name": "Desk", "capacity": 1 }, { "name": "Clerk", "capacity": 1 } ],
    "stages": [
        { "name": "desk", "resources": ["Desk"],
          "service": { "kind": "deterministic", "value": 5 } }
    ]
}
"#;

fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split_whitespace()
        .find_map(|kv| kv.strip_prefix(key)?.strip_prefix('='))
}

#[test]
fn ed_run_prints_summary_and_writes_json() {
    let dir = unique_temp_dir("ed-run");
    let scenario = write_file(&dir, "scenario.json", SINGLE_DESK);
    let out_json = dir.join("stats.json");

    let output = Command::new(env!("CARGO_BIN_EXE_ed_run"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--seed",
            "3",
            "--json-out",
            out_json.to_str().unwrap(),
        ])
        .output()
        .expect("run ed_run");
    assert!(
        output.status.success(),
        "ed_run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let run = stdout
        .lines()
        .find(|l| l.starts_with("run "))
        .expect("run line");
    assert_eq!(field(run, "seed"), Some("3"));
    assert_eq!(field(run, "arrivals"), Some("10"));
    assert_eq!(field(run, "departures"), Some("10"));

    let tat = stdout
        .lines()
        .find(|l| l.starts_with("tat "))
        .expect("tat line");
    assert_eq!(field(tat, "mean"), Some("5.0000"));

    let resources: Vec<&str> = stdout
        .lines()
        .filter(|l| l.starts_with("resource "))
        .collect();
    assert_eq!(resources.len(), 2);
    assert_eq!(field(resources[0], "utilization"), Some("0.5000"));

    let raw = fs::read_to_string(&out_json).expect("read stats.json");
    let v: Value = serde_json::from_str(&raw).expect("parse stats.json");
    assert_eq!(v["tat"]["count"].as_u64(), Some(10));
    assert_eq!(v["patients"].as_array().map(|a| a.len()), Some(10));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ed_run_applies_capacity_and_horizon_overrides() {
    let dir = unique_temp_dir("ed-run-overrides");
    let scenario = write_file(&dir, "scenario.json", SINGLE_DESK);

    let output = Command::new(env!("CARGO_BIN_EXE_ed_run"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--capacity",
            "Desk=3",
            "--horizon-minutes",
            "50",
            "--warmup-minutes",
            "15",
        ])
        .output()
        .expect("run ed_run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let run = stdout.lines().find(|l| l.starts_with("run ")).expect("run line");
    assert_eq!(field(run, "arrivals"), Some("5"));
    assert_eq!(field(run, "excluded_warmup"), Some("2"));
    let desk = stdout
        .lines()
        .find(|l| l.starts_with("resource name=\"Desk\""))
        .expect("desk line");
    assert_eq!(field(desk, "capacity"), Some("3"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ed_run_rejects_bad_input() {
    let dir = unique_temp_dir("ed-run-bad");
    let scenario = write_file(&dir, "scenario.json", SINGLE_DESK);

    let unknown = Command::new(env!("CARGO_BIN_EXE_ed_run"))
        .args(["--scenario", scenario.to_str().unwrap(), "--capacity", "Porter=2"])
        .output()
        .expect("run ed_run");
    assert!(!unknown.status.success());
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("Porter"));

    let malformed = Command::new(env!("CARGO_BIN_EXE_ed_run"))
        .args(["--scenario", scenario.to_str().unwrap(), "--capacity", "Desk"])
        .output()
        .expect("run ed_run");
    assert!(!malformed.status.success());

    let broken = write_file(&dir, "broken.json", "{ \"schema_version\": 1 }");
    let output = Command::new(env!("CARGO_BIN_EXE_ed_run"))
        .args(["--scenario", broken.to_str().unwrap()])
        .output()
        .expect("run ed_run");
    assert!(!output.status.success());

    let _ = fs::remove_dir_all(&dir);
}
