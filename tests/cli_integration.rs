//! Integration tests for the command-line interface
//!
//! Drives the built binary with piped answers to the interactive prompts.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Helper to create a minimal template directory
fn setup_template() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("index.html"),
        "<p class=\"app-name\">Old</p>\n<p class=\"publisher\">Old Co</p>\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("index.js"),
        "const ENDPOINT_URL = 'https://example.invalid';\n",
    )
    .unwrap();
    for name in ["preload.js", "renderer.js", "styles.css"] {
        fs::write(dir.path().join(name), "").unwrap();
    }
    dir
}

fn run_cli(args: &[&str], dir: &Path, answers: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_template-stamper"))
        .args(args)
        .arg(dir)
        .arg("--no-color")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(answers.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_template-stamper"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--recipe"));
}

#[test]
fn test_missing_files_exit_failure() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(&[], dir.path(), "");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing required files: index.js, index.html"));
}

#[test]
fn test_interactive_run_prints_one_line_per_step() {
    let dir = setup_template();
    let output = run_cli(&[], dir.path(), "Demo\nExample Corp\nhttps://example.test\n\nn\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✓ display text: display text 'Demo', attribution 'Example Corp'"));
    assert!(stdout.contains("✓ endpoint: endpoint set to https://example.test"));
    assert!(stdout.contains("⊘ icon: skipped (no icon given)"));
    assert!(stdout.contains("⊘ package: skipped (not requested)"));

    let markup = fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(markup.contains("<p class=\"app-name\">Demo</p>"));
    assert!(dir.path().join("package.json").exists());
}

#[test]
fn test_dry_run_leaves_template_alone() {
    let dir = setup_template();
    let before = fs::read(dir.path().join("index.html")).unwrap();
    let output = run_cli(&["--dry-run"], dir.path(), "Demo\n\n\n\n\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[DRY RUN"));
    assert!(stdout.contains("+<p class=\"app-name\">Demo</p>"));
    assert_eq!(fs::read(dir.path().join("index.html")).unwrap(), before);
    assert!(!dir.path().join("package.json").exists());
}

#[test]
fn test_bad_recipe_is_unexpected_error() {
    let dir = setup_template();
    let recipe = dir.path().join("recipe.toml");
    fs::write(&recipe, "[files\n").unwrap();

    let output = run_cli(&["--recipe", recipe.to_str().unwrap()], dir.path(), "");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unexpected error"));
    assert!(stderr.contains("recipe.toml"));
}
