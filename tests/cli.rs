#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

#[test]
fn run_loads_default_dotenv_file() {
    let dir = make_temp_dir("cli-default");
    write_file(&dir.join(".env"), "LOADENV_CLI_DEFAULT=from_default\n");

    let output = run_loadenv(
        &dir,
        &["run", "--", "printenv", "LOADENV_CLI_DEFAULT"],
        None,
    );

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "from_default");
}

#[test]
fn run_uses_last_file_precedence_for_selected_files() {
    let dir = make_temp_dir("cli-precedence");
    write_file(&dir.join(".env.base"), "LOADENV_CLI_PRECEDENCE=base\n");
    write_file(&dir.join(".env.local"), "LOADENV_CLI_PRECEDENCE=local\n");

    let output = run_loadenv(
        &dir,
        &[
            "run",
            "-f",
            ".env.base,.env.local",
            "--",
            "printenv",
            "LOADENV_CLI_PRECEDENCE",
        ],
        None,
    );

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "local");
}

#[test]
fn run_override_flag_controls_existing_environment_precedence() {
    let dir = make_temp_dir("cli-override");
    write_file(&dir.join(".env"), "LOADENV_CLI_OVERRIDE=from_file\n");

    let without_override = run_loadenv(
        &dir,
        &["run", "--", "printenv", "LOADENV_CLI_OVERRIDE"],
        Some(("LOADENV_CLI_OVERRIDE", "from_env")),
    );
    assert_success(&without_override);
    assert_eq!(stdout_trimmed(&without_override), "from_env");

    let with_override = run_loadenv(
        &dir,
        &["run", "-o", "--", "printenv", "LOADENV_CLI_OVERRIDE"],
        Some(("LOADENV_CLI_OVERRIDE", "from_env")),
    );
    assert_success(&with_override);
    assert_eq!(stdout_trimmed(&with_override), "from_file");
}

#[test]
fn run_ignore_missing_skips_missing_selected_files() {
    let dir = make_temp_dir("cli-ignore-missing");
    write_file(&dir.join(".env.real"), "LOADENV_CLI_IGNORE=loaded\n");

    let output = run_loadenv(
        &dir,
        &[
            "run",
            "--ignore-missing",
            "-f",
            "missing.env,.env.real",
            "--",
            "printenv",
            "LOADENV_CLI_IGNORE",
        ],
        None,
    );

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "loaded");
}

#[test]
fn run_without_ignore_missing_fails_when_selected_file_is_missing() {
    let dir = make_temp_dir("cli-required");
    write_file(&dir.join(".env.real"), "LOADENV_CLI_REQUIRED=loaded\n");

    let output = run_loadenv(
        &dir,
        &[
            "run",
            "-f",
            "missing.env,.env.real",
            "--",
            "printenv",
            "LOADENV_CLI_REQUIRED",
        ],
        None,
    );

    assert!(
        !output.status.success(),
        "expected missing file to fail: stdout={:?}, stderr={:?}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("missing.env"),
        "expected offending path in stderr: {stderr:?}"
    );
}

#[test]
fn run_honors_dotenv_config_path_environment_default() {
    let dir = make_temp_dir("cli-config-path");
    write_file(&dir.join("custom.env"), "LOADENV_CLI_CONFIG_PATH=custom\n");

    let output = run_loadenv(
        &dir,
        &["run", "--", "printenv", "LOADENV_CLI_CONFIG_PATH"],
        Some(("DOTENV_CONFIG_PATH", "custom.env")),
    );

    assert_success(&output);
    assert_eq!(stdout_trimmed(&output), "custom");
}

#[test]
fn run_loads_colon_and_export_syntax() {
    let dir = make_temp_dir("cli-syntax");
    write_file(
        &dir.join(".env"),
        "export LOADENV_CLI_EXPORTED=1\nLOADENV_CLI_COLON: two words\n",
    );

    let exported = run_loadenv(&dir, &["run", "--", "printenv", "LOADENV_CLI_EXPORTED"], None);
    assert_success(&exported);
    assert_eq!(stdout_trimmed(&exported), "1");

    let colon = run_loadenv(&dir, &["run", "--", "printenv", "LOADENV_CLI_COLON"], None);
    assert_success(&colon);
    assert_eq!(stdout_trimmed(&colon), "two words");
}

fn run_loadenv(dir: &Path, args: &[&str], env_pair: Option<(&str, &str)>) -> Output {
    let mut command = Command::new(loadenv_bin());
    command.current_dir(dir).args(args);
    if let Some((key, value)) = env_pair {
        command.env(key, value);
    }
    command.output().expect("failed to run loadenv binary")
}

fn loadenv_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_loadenv"))
}

fn stdout_trimmed(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout)
        .trim_end()
        .to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success: stdout={:?}, stderr={:?}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn make_temp_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    path.push(format!("loadenv-{name}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&path).expect("failed to create temp dir");
    path
}

fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).expect("failed to write test file");
}
