mod common;
use common::*;

use std::path::PathBuf;
use tempfile::TempDir;

fn log_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.ends_with(".log"))
        .collect();
    names.sort();
    names
}

#[test]
fn test_one_log_file_per_bulk() {
    let dir = TempDir::new().unwrap();
    let (_stdout, _stderr, code) = run_bulkmt_with_input(
        &["2", "--no-stats"],
        "a\nb\nc\nd\ne\n",
        dir.path(),
    );

    assert_eq!(code, 0);
    assert_eq!(
        log_contents(dir.path()),
        vec!["bulk: a b \n", "bulk: c d \n", "bulk: e \n"]
    );
}

#[test]
fn test_log_file_names() {
    let dir = TempDir::new().unwrap();
    let (_stdout, _stderr, code) =
        run_bulkmt_with_input(&["1", "--no-stats", "--no-screen"], "a\nb\nc\n", dir.path());

    assert_eq!(code, 0);
    let names = log_names(dir.path());
    assert_eq!(names.len(), 3);
    let mut seqs: Vec<u64> = names
        .iter()
        .map(|name| {
            let stem = name
                .strip_prefix("bulk")
                .and_then(|n| n.strip_suffix(".log"))
                .unwrap();
            let (ts, seq) = stem.split_once('_').unwrap();
            assert!(ts.parse::<i64>().unwrap() > 0);
            seq.parse::<u64>().unwrap()
        })
        .collect();
    seqs.sort();
    assert_eq!(seqs, vec![0, 1, 2]);
}

#[test]
fn test_output_dir_option() {
    let cwd = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (_stdout, _stderr, code) = run_bulkmt_with_input(
        &[
            "3",
            "--no-stats",
            "--output-dir",
            out.path().to_str().unwrap(),
        ],
        "a\nb\n",
        cwd.path(),
    );

    assert_eq!(code, 0);
    assert_eq!(log_contents(out.path()), vec!["bulk: a b \n"]);
    assert!(log_names(cwd.path()).is_empty());
}

#[test]
fn test_missing_output_dir_is_usage_error() {
    let cwd = TempDir::new().unwrap();
    let missing: PathBuf = cwd.path().join("nope");
    let (_stdout, stderr, code) = run_bulkmt_with_input(
        &["3", "--output-dir", missing.to_str().unwrap()],
        "a\n",
        cwd.path(),
    );

    assert_eq!(code, 2);
    assert!(stderr.contains("does not exist"));
}

#[test]
fn test_no_files_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, code) =
        run_bulkmt_with_input(&["2", "--no-files"], "a\nb\nc\n", dir.path());

    assert_eq!(code, 0);
    assert!(log_names(dir.path()).is_empty());
    assert!(stdout.contains("SCREEN"));
    assert!(!stdout.contains("FILE"));
}

#[test]
fn test_file_workers_alternate() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, code) = run_bulkmt_with_input(
        &["1", "--no-screen", "--file-threads", "2"],
        "a\nb\nc\nd\ne\n",
        dir.path(),
    );

    assert_eq!(code, 0);
    assert_eq!(log_names(dir.path()).len(), 5);

    let file_section = stdout.split("FILE\n").nth(1).unwrap();
    let mut parts = file_section.split("Commands\n");
    let blocks: Vec<&str> = parts.next().unwrap().lines().filter(|l| l.contains("=>")).collect();
    let commands: Vec<&str> = parts.next().unwrap().lines().filter(|l| l.contains("=>")).collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].ends_with("=> 3"));
    assert!(blocks[1].ends_with("=> 2"));
    assert!(commands[0].ends_with("=> 3"));
    assert!(commands[1].ends_with("=> 2"));
}
