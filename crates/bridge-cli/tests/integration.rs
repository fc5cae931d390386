#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bridge(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bridge").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("BRIDGE_CONFIG")
        .env_remove("BRIDGE_BUNDLE_DIR")
        .env_remove("BRIDGE_DEV_SERVER_URL");
    cmd
}

/// A built bundle under `<dir>/dist` and a config file pointing at it.
fn init_bundle(dir: &TempDir) {
    let vite = dir.path().join("dist/.vite");
    std::fs::create_dir_all(&vite).unwrap();
    std::fs::write(
        vite.join("manifest.json"),
        r#"{"src/main.tsx": {"file": "assets/main-9f8e.js", "css": ["assets/main-9f8e.css"]}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("bridge.yaml"),
        "bundle_dir: dist\nstatic_url: /assets-root/\n",
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// bridge assets
// ---------------------------------------------------------------------------

#[test]
fn assets_from_dev_server() {
    let dir = TempDir::new().unwrap();
    bridge(&dir)
        .args(["--dev-server-url", "http://localhost:5173/", "assets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:5173/@vite/client"))
        .stdout(predicate::str::contains("http://localhost:5173/src/main.tsx"))
        .stdout(predicate::str::contains("refresh"));
}

#[test]
fn assets_json_from_config_file() {
    let dir = TempDir::new().unwrap();
    init_bundle(&dir);
    let output = bridge(&dir)
        .args(["--config", "bridge.yaml", "assets", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["scripts"], serde_json::json!(["/assets-root/assets/main-9f8e.js"]));
    assert_eq!(json["styles"], serde_json::json!(["/assets-root/assets/main-9f8e.css"]));
    assert!(json["dev_refresh_url"].is_null());
}

#[test]
fn config_path_from_env() {
    let dir = TempDir::new().unwrap();
    init_bundle(&dir);
    bridge(&dir)
        .env("BRIDGE_CONFIG", dir.path().join("bridge.yaml"))
        .arg("assets")
        .assert()
        .success()
        .stdout(predicate::str::contains("main-9f8e.js"));
}

#[test]
fn assets_fail_without_manifest() {
    let dir = TempDir::new().unwrap();
    bridge(&dir)
        .args(["--bundle-dir", "nowhere", "assets"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error:"))
        .stderr(predicate::str::contains("manifest"));
}

// ---------------------------------------------------------------------------
// bridge check
// ---------------------------------------------------------------------------

#[test]
fn check_passes_for_valid_bundle() {
    let dir = TempDir::new().unwrap();
    init_bundle(&dir);
    bridge(&dir)
        .args(["--config", "bridge.yaml", "check"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok: bundle"));
}

#[test]
fn check_reports_missing_entry_point() {
    let dir = TempDir::new().unwrap();
    init_bundle(&dir);
    std::fs::write(
        dir.path().join("bridge.yaml"),
        "bundle_dir: dist\nentry_point: src/admin.tsx\n",
    )
    .unwrap();
    bridge(&dir)
        .args(["--config", "bridge.yaml", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("src/admin.tsx"));
}

#[test]
fn check_reports_missing_template() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("bridge.yaml"),
        "dev_server_url: http://localhost:5173\nbootstrap_template: site/shell.html\n",
    )
    .unwrap();
    bridge(&dir)
        .args(["--config", "bridge.yaml", "check", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("site/shell.html"));
}

#[test]
fn check_json_report() {
    let dir = TempDir::new().unwrap();
    let output = bridge(&dir)
        .args(["--dev-server-url", "http://localhost:5173", "check", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["source"], "dev-server");
    assert_eq!(json["framework"], "react");
    assert_eq!(json["scripts"], 2);
}

#[test]
fn no_asset_source_is_an_error() {
    let dir = TempDir::new().unwrap();
    bridge(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: invalid bridge configuration"));
}

#[test]
fn both_asset_sources_are_an_error() {
    let dir = TempDir::new().unwrap();
    bridge(&dir)
        .args([
            "--bundle-dir",
            "dist",
            "--dev-server-url",
            "http://localhost:5173",
            "check",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}
