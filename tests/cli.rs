//! End-to-end tests for the `fs-jail` binary.
#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fs_jail() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fs-jail"));
    cmd.env_remove("FS_JAIL_LOG").env_remove("FS_JAIL_POSTURE");
    cmd
}

#[test]
fn test_help_exits_zero() {
    fs_jail()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("[option...] -- command [arg...]"))
        .stdout(predicate::str::contains("-W <working-dir>"));
}

#[test]
fn test_missing_terminator_is_usage_error() {
    fs_jail()
        .args(["-D", "/bin/echo", "hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown option: /bin/echo"))
        .stderr(predicate::str::contains("Possible arguments:"));

    fs_jail()
        .args(["-D"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Command to sandbox not specified"));
}

#[test]
fn test_empty_command_is_usage_error() {
    fs_jail()
        .args(["-r", "/tmp", "--"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Command to sandbox not specified"));
}

#[test]
fn test_unknown_option_and_argument() {
    fs_jail()
        .args(["-q", "--", "echo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown option: -q"));

    fs_jail()
        .args(["stray", "--", "echo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown argument: stray"));
}

#[test]
fn test_missing_value_does_not_crash() {
    fs_jail()
        .args(["-w"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing value for option -w"));
}

#[test]
fn test_bad_timeout_reported() {
    fs_jail()
        .args(["-T", "ten", "--", "echo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ten is not valid number"));
}

#[test]
fn test_output_redirected_to_files() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out.txt");
    let err = tmp.path().join("err.txt");

    fs_jail()
        .arg("-l")
        .arg(&out)
        .arg("-L")
        .arg(&err)
        .args(["--", "echo", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "hello\n");
    assert_eq!(std::fs::read_to_string(&err).unwrap(), "");
}

#[test]
fn test_output_forwarded_when_not_redirected() {
    fs_jail()
        .args(["--", "/bin/sh", "-c", "echo to-out; echo to-err >&2"])
        .assert()
        .success()
        .stdout("to-out\n")
        .stderr("to-err\n");
}

#[test]
fn test_child_exit_code_propagated() {
    fs_jail()
        .args(["--", "/bin/sh", "-c", "exit 42"])
        .assert()
        .code(42);
}

#[test]
fn test_arguments_reach_child_intact() {
    fs_jail()
        .args([
            "--",
            "/bin/sh",
            "-c",
            "for a in \"$@\"; do printf '[%s]\\n' \"$a\"; done",
            "sh",
            "",
            "two words",
            "quote\"inside",
            "back\\slash\\",
        ])
        .assert()
        .success()
        .stdout("[]\n[two words]\n[quote\"inside]\n[back\\slash\\]\n");
}

#[test]
fn test_debug_echoes_scopes() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path();

    fs_jail()
        .current_dir(work)
        .args(["-D", "-r", "/usr", "-w", "out", "-b", "/usr/secret", "--", "/bin/sh", "-c", "true"])
        .assert()
        .success()
        .stderr(format!(
            "na: <root>\nna: {w}\nro: /bin/sh\nro: /usr\nrw: {w}/out\nna: /usr/secret\n",
            w = std::fs::canonicalize(work).unwrap().display()
        ));
}

#[test]
fn test_read_posture_from_environment() {
    fs_jail()
        .env("FS_JAIL_POSTURE", "read")
        .args(["-D", "-W", "/tmp", "--", "/bin/sh", "-c", "true"])
        .assert()
        .success()
        .stderr(predicate::str::starts_with("ro: <root>\nna: /tmp\n"));
}

#[test]
fn test_unknown_posture_rejected() {
    fs_jail()
        .env("FS_JAIL_POSTURE", "allow-all")
        .args(["--", "/bin/sh", "-c", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown policy posture: allow-all"));
}

#[test]
fn test_arg_file_expanded() {
    let tmp = TempDir::new().unwrap();
    let params = tmp.path().join("params");
    let out = tmp.path().join("out.txt");
    std::fs::write(&params, format!("-l\n{}\n", out.display())).unwrap();

    fs_jail()
        .arg(format!("@{}", params.display()))
        .args(["--", "/bin/sh", "-c", "echo \"$0\"", "@not-expanded"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "@not-expanded\n");
}

#[test]
fn test_missing_executable_fails() {
    fs_jail()
        .args(["--", "fs-jail-no-such-binary"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("executable not found"));
}

#[test]
fn test_timeout_terminates_child() {
    fs_jail()
        .args(["-T", "1", "--", "/bin/sleep", "30"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure();
}
