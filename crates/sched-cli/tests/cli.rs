//! Binary-level tests: exit codes and output that need no daemon.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

fn schedacct() -> Command {
    let mut cmd = Command::cargo_bin("schedacct").expect("binary built");
    cmd.env_remove("SCHED_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn schedctl() -> Command {
    let mut cmd = Command::cargo_bin("schedctl").expect("binary built");
    cmd.env_remove("SCHED_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn conflicting_list_flags_exit_usage() {
    schedacct()
        .args([
            "modify",
            "account",
            "-N",
            "physics",
            "--set-allowed-qos-list",
            "normal",
            "--add-allowed-qos-list",
            "high",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[test]
fn modify_without_items_exit_usage() {
    schedacct()
        .args(["-C", "/nonexistent/sched.toml", "modify", "user", "-N", "alice"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "you must specify at least one modification item",
        ));
}

#[test]
fn bad_field_format_exit_usage() {
    schedacct()
        .args(["show", "account", "-o", "%n %Z"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown format directive"));
}

#[test]
fn oversized_field_width_exit_usage() {
    schedacct()
        .args(["-C", "/nonexistent/sched.toml", "show", "account", "-o", "%.100000n"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid width"));
}

#[test]
fn drain_without_reason_exit_usage() {
    schedctl()
        .args(["update", "node", "-n", "cn01", "-t", "drain"])
        .assert()
        .code(2);
}

#[test]
fn show_config_is_flattened() {
    let file = config_file(
        "control_host = \"ctld01\"\n\
         [log]\n\
         level = \"info\"\n\
         [[partitions]]\n\
         name = \"gpu\"\n\
         nodes = [\"gn01\", \"gn02\"]\n",
    );

    schedctl()
        .arg("-C")
        .arg(file.path())
        .args(["show", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("control_host = ctld01\n"))
        .stdout(predicate::str::contains("log.level = info\n"))
        .stdout(predicate::str::contains("partitions.0.name = gpu\n"))
        .stdout(predicate::str::contains("partitions.0.nodes.1 = gn02\n"));
}

#[test]
fn show_config_reads_env_path() {
    let file = config_file("a = { b = [1, 2] }\n");

    schedctl()
        .env("SCHED_CONFIG", file.path())
        .args(["show", "config"])
        .assert()
        .success()
        .stdout("a.b.0 = 1\na.b.1 = 2\n");
}

#[test]
fn missing_config_exit_usage() {
    schedacct()
        .args(["-C", "/nonexistent/sched.toml", "show", "qos"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn unreachable_daemon_exit_transport() {
    let file = config_file(
        "control_host = \"127.0.0.1\"\n\
         control_port = 1\n\
         connect_timeout_secs = 2\n",
    );

    schedacct()
        .arg("-C")
        .arg(file.path())
        .args(["find", "account", "physics"])
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("Error: "));
}
