//! End-to-end tests for the `vpn` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vpn(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vpn").expect("vpn binary");
    cmd.env_remove("VPN_DATA_DIR")
        .env("RUST_LOG", "off")
        .arg("--data-dir")
        .arg(dir.path());
    cmd
}

fn initialized() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    vpn(&dir)
        .args(["init", "--endpoint", "vpn.example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vpn.example.com:51820"));
    assert!(dir.path().join("vpn.db").exists());
    dir
}

#[test]
fn commands_before_init_fail() {
    let dir = tempfile::tempdir().expect("tempdir");
    vpn(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: not initialized"));
}

#[test]
fn init_twice_fails() {
    let dir = initialized();
    vpn(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn add_list_remove_lifecycle() {
    let dir = initialized();

    vpn(&dir)
        .args(["add", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.2/32"))
        .stdout(predicate::str::contains("Endpoint = vpn.example.com:51820"));
    vpn(&dir)
        .args(["add", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.3/32"));
    vpn(&dir)
        .args(["add", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("peer already exists: alice"));

    vpn(&dir)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("Total: 2 peer(s)"));

    vpn(&dir).args(["rm", "alice"]).assert().success();
    vpn(&dir)
        .args(["remove", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("peer not found: alice"));

    vpn(&dir)
        .args(["add", "carol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.2/32"));
}

#[test]
fn json_list_omits_private_keys() {
    let dir = initialized();
    vpn(&dir).args(["add", "alice"]).assert().success();

    let output = vpn(&dir)
        .args(["--format", "json", "list"])
        .output()
        .expect("run list");
    assert!(output.status.success());
    let peers: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(peers[0]["name"], "alice");
    assert_eq!(peers[0]["ip"], "10.0.0.2");
    assert!(peers[0].get("privateKey").is_none());
    assert!(peers[0].get("private_key").is_none());
}

#[test]
fn disabled_peer_leaves_peer_config() {
    let dir = initialized();
    vpn(&dir).args(["add", "alice"]).assert().success();

    vpn(&dir)
        .arg("peer-config")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[Peer]\n"));

    vpn(&dir).args(["disable", "alice"]).assert().success();
    vpn(&dir)
        .arg("peer-config")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    vpn(&dir).args(["enable", "alice"]).assert().success();
    vpn(&dir)
        .arg("server-config")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[Interface]\n"))
        .stdout(predicate::str::contains("AllowedIPs = 10.0.0.2/32"));
}

#[test]
fn export_writes_files() {
    let dir = initialized();
    vpn(&dir).args(["add", "alice"]).assert().success();
    vpn(&dir)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("wg syncconf wg0"));

    let peers = std::fs::read_to_string(dir.path().join("peers.conf")).expect("peers.conf");
    assert!(peers.starts_with("[Peer]\n"));
    assert!(dir.path().join("wg0.conf").exists());
}

#[test]
fn client_config_for_unknown_peer_fails() {
    let dir = initialized();
    vpn(&dir)
        .args(["client-config", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("peer not found: ghost"));
}
