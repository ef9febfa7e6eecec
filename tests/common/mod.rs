// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run bulkmt in `cwd` with the given arguments and stdin.
/// User and project config files are always ignored.
pub fn run_bulkmt_with_input(args: &[&str], input: &str, cwd: &Path) -> (String, String, i32) {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bulkmt"))
        .arg("--ignore-config")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start bulkmt");

    if let Some(mut stdin) = cmd.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .expect("Failed to write to stdin");
    }

    let output = cmd.wait_with_output().expect("Failed to read output");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// Screen lines with the worker tag stripped, in print order
pub fn screen_bulks(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_once(" bulk: "))
        .map(|(_, rest)| format!("bulk: {}", rest))
        .collect()
}

/// Contents of every bulk*.log file in `dir`, sorted
pub fn log_contents(dir: &Path) -> Vec<String> {
    let mut contents: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read output dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("bulk") && n.ends_with(".log"))
        })
        .map(|path| std::fs::read_to_string(path).expect("Failed to read log file"))
        .collect();
    contents.sort();
    contents
}
