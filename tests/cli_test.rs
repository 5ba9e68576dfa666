use assert_cmd::Command;
use predicates::str::contains;
use std::fs;

fn cmd(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("ntpsync").unwrap();
    cmd.env("NTPSYNC_CONFIG_DIR", config_dir)
        .env_remove("NTPSYNC_LOG")
        .arg("--no-color");
    cmd
}

#[test]
fn test_zones_listing() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("--zones")
        .assert()
        .success()
        .stdout(contains("America/Sao_Paulo"))
        .stdout(contains("UTC-03:00"));
}

#[test]
fn test_status_never_synced() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("--status")
        .assert()
        .success()
        .stdout(contains("never"));
}

#[test]
fn test_status_reads_state_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("state.toml"),
        "[ntp]\nlastSync = 1700000000\nutcOffset = -10800\n",
    )
    .unwrap();
    cmd(dir.path())
        .arg("--status")
        .assert()
        .success()
        .stdout(contains("2023-11-14 22:13:20"))
        .stdout(contains("UTC-03:00"));
}

#[test]
fn test_zero_retries_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["--once", "--max-retries", "0"])
        .assert()
        .code(1)
        .stdout(contains("Error:"));
}

#[test]
fn test_huge_interval_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["--sync-interval", "18446744073709551615"])
        .assert()
        .code(1)
        .stdout(contains("intervals must be at most"));
}

#[test]
fn test_quiet_silences_logs() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["--once", "--quiet", "--interface", "definitely-missing0"])
        .args(["--server", "127.0.0.1"])
        .assert()
        .code(4)
        .stderr(predicates::str::is_empty());
}

#[test]
fn test_logs_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["--once", "--interface", "definitely-missing0"])
        .args(["--server", "127.0.0.1"])
        .assert()
        .code(4)
        .stderr(contains("network link down"))
        .stderr(contains("configured"));
}

#[test]
fn test_link_down_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["--once", "--quiet", "--interface", "definitely-missing0"])
        .args(["--server", "127.0.0.1"])
        .assert()
        .code(4)
        .stdout(contains("link"));
}

#[test]
fn test_unreachable_server_exhausts() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["--once", "--quiet", "--raw", "--timeout", "1", "--max-retries", "1"])
        .args(["--server", "127.0.0.1"])
        .assert()
        .code(3)
        .stdout(contains("all servers failed"));
    assert!(!dir.path().join("state.toml").exists());
}

#[cfg(feature = "network-tests")]
#[test]
fn test_once_against_pool() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["--once", "--server", "pool.ntp.org", "-z", "America/Sao_Paulo"])
        .assert()
        .success()
        .stdout(contains("Server:"));
    assert!(dir.path().join("state.toml").exists());
}
