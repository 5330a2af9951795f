use std::path::Path;
use std::process::Command;

fn awstools(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_awstools"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("AWS_PROFILE")
        .env_remove("AWS_DEFAULT_PROFILE")
        .env_remove("AWS_REGION")
        .env_remove("AWS_DEFAULT_REGION")
        .env_remove("AUTO_CONFIRM")
        .env_remove("LOG_FILE")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn no_args_shows_help_and_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = awstools(home.path()).output().expect("failed to execute");

    assert!(output.status.success(), "expected exit code 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: awstools"));
    assert!(stdout.contains("Commands:"));
    for cmd in ["quicksight", "ec2", "auth", "config", "status"] {
        assert!(stdout.contains(cmd), "help missing command: {cmd}");
    }
}

#[test]
fn version_flag_shows_version() {
    let home = tempfile::tempdir().unwrap();
    let output = awstools(home.path())
        .arg("--version")
        .output()
        .expect("failed to execute");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("awstools "));
}

#[test]
fn subcommand_without_action_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let cases = [
        ("qs", "backup"),
        ("quicksight", "restore"),
        ("ec2", "start"),
        ("auth", "switch"),
    ];

    for (cmd, expected) in cases {
        let output = awstools(home.path()).arg(cmd).output().expect("failed to execute");
        assert!(output.status.success(), "{cmd} should exit 0");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains(expected), "{cmd} help missing {expected}");
    }
}

#[test]
fn invalid_instance_id_fails_before_any_call() {
    let home = tempfile::tempdir().unwrap();
    let output = awstools(home.path())
        .args(["ec2", "start", "not-an-instance", "-y"])
        .output()
        .expect("failed to execute");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("InvalidParameter"), "stderr: {stderr}");
}

#[test]
fn start_requires_ids() {
    let home = tempfile::tempdir().unwrap();
    let output = awstools(home.path())
        .args(["ec2", "start"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}

#[test]
fn restore_file_and_dir_conflict() {
    let home = tempfile::tempdir().unwrap();
    let output = awstools(home.path())
        .args(["qs", "restore", "-f", "a.json", "-d", "backup"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}

#[test]
fn config_shows_defaults_then_init_writes_file() {
    let home = tempfile::tempdir().unwrap();

    let output = awstools(home.path())
        .args(["--profile", "dev", "config"])
        .output()
        .expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("not found, using defaults"));
    assert!(stdout.contains("dev"));

    let output = awstools(home.path())
        .args(["config", "--init"])
        .output()
        .expect("failed to execute");
    assert!(output.status.success());
    assert!(home
        .path()
        .join(".config/awstools/settings.toml")
        .exists());
}

#[test]
fn invalid_command_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = awstools(home.path())
        .arg("invalid")
        .output()
        .expect("failed to execute");
    assert!(!output.status.success(), "expected non-zero exit code");
}
