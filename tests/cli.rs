use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const CONFIG: &str = r#"
[task.copy]
src = ["src/*.txt"]
dest = "out"

[task.shout]
src = ["src/*.txt"]
dest = "loud"
after = ["copy"]

  [[task.shout.stages]]
  kind = "rename"
  extname = ".md"

[task.bad]
src = ["src/*.scss"]
dest = "out"
stages = [{ kind = "sass" }]

[task.default]
after = ["shout"]
"#;

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("Taskpipe.toml"), CONFIG).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/hello.txt"), "hello").unwrap();
    fs::write(root.join("src/oops.scss"), ".a { color: $nope; }").unwrap();
    dir
}

fn taskpipe(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("taskpipe").unwrap();
    cmd.arg("--config").arg(root.join("Taskpipe.toml"));
    cmd
}

#[test]
fn run_succeeds_and_writes_outputs() {
    let dir = project();

    taskpipe(dir.path()).args(["run", "default"]).assert().success();

    assert_eq!(fs::read_to_string(dir.path().join("out/hello.txt")).unwrap(), "hello");
    assert_eq!(fs::read_to_string(dir.path().join("loud/hello.md")).unwrap(), "hello");
}

#[test]
fn dry_run_prints_order_without_writing() {
    let dir = project();

    taskpipe(dir.path())
        .args(["run", "default", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. copy"))
        .stdout(predicate::str::contains("2. shout"))
        .stdout(predicate::str::contains("3. default"));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn failing_stage_exits_non_zero_with_task_and_stage() {
    let dir = project();

    taskpipe(dir.path())
        .args(["run", "bad"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("taskpipe error: task 'bad' failed"))
        .stderr(predicate::str::contains("stage 'sass'"))
        .stderr(predicate::str::contains("oops.scss"));
}

#[test]
fn unknown_task_exits_non_zero() {
    let dir = project();

    taskpipe(dir.path())
        .args(["run", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task not found: nope"));
}

#[test]
fn list_prints_tasks_in_declaration_order() {
    let dir = project();

    taskpipe(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)copy.*shout.*bad.*default").unwrap())
        .stdout(predicate::str::contains("stages: rename"));
}

#[test]
fn missing_config_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();

    taskpipe(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Taskpipe.toml"));
}

#[test]
fn watch_without_patterns_fails_at_startup() {
    let dir = project();

    taskpipe(dir.path())
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Watch subscription error"));
}
