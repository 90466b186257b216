//! Process-level behaviour of the `get-aria2` binary.

use std::process::Command;

fn get_aria2() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_get-aria2"));
    // Keep the tests off the network even if a proxy is configured
    cmd.env_remove("http_proxy")
        .env_remove("HTTP_PROXY")
        .env_remove("PROXY_URL");
    cmd
}

#[test]
fn test_help_exits_zero() {
    let output = get_aria2().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--platform"));
    assert!(stdout.contains("--chmod"));
}

#[test]
fn test_unsupported_platform_exits_one() {
    let output = get_aria2()
        .args(["-p", "freebsd", "-a", "x64"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported platform \"freebsd\""));
}

#[test]
fn test_unsupported_pair_exits_one_without_status_lines() {
    let temp = tempfile::TempDir::new().unwrap();
    let dest = temp.path().join("aria2c");

    let output = get_aria2()
        .arg(&dest)
        .args(["--platform", "win32", "--arch", "arm"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    // Validation happens before the first status line
    assert!(output.stdout.is_empty());
    assert!(!dest.exists());
}
