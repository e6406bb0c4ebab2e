//! 命令行端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;

fn configs() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs")
}

fn cli() -> Command {
    Command::cargo_bin("ctc-cli").unwrap()
}

#[test]
fn test_check_valid_config() {
    cli()
        .arg("check")
        .arg(configs().join("planar3.toml"))
        .arg("--model")
        .arg(configs().join("planar3_chain.toml"))
        .arg("--mode")
        .arg("task-pose")
        .assert()
        .success()
        .stdout(predicate::str::contains("配置有效"))
        .stdout(predicate::str::contains("shoulder"));
}

#[test]
fn test_check_rejects_unknown_joint() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "control_rate = 1000.0\n[[joints]]\nname = \"shoulder\"\nkp = 1.0\nkd = 1.0\n\
         [[joints]]\nname = \"gripper\"\nkp = 1.0\nkd = 1.0"
    )
    .unwrap();

    cli()
        .arg("check")
        .arg(file.path())
        .arg("--model")
        .arg(configs().join("planar3_chain.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("gripper"));
}

#[test]
fn test_check_rejects_negative_gain() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "control_rate = 1000.0\n[[joints]]\nname = \"j\"\nkp = -1.0\nkd = 1.0"
    )
    .unwrap();

    cli().arg("check").arg(file.path()).assert().failure();
}

#[test]
fn test_simulate_ends_with_zero_command() {
    cli()
        .args(["simulate", "--fast", "--cycles", "200", "--config"])
        .arg(configs().join("planar3.toml"))
        .arg("--model")
        .arg(configs().join("planar3_chain.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("迭代: 200"))
        .stdout(predicate::str::contains("最后一条命令: 零力矩"));
}

#[test]
fn test_simulate_rejects_wrong_target_length() {
    cli()
        .args(["simulate", "--fast", "--mode", "task-velocity", "--target", "0.1,0.2"])
        .arg("--config")
        .arg(configs().join("planar3.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--target"));
}
