mod common;
use common::*;

use tempfile::TempDir;

#[test]
fn test_size_bulks_printed_with_worker_tag() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) =
        run_bulkmt_with_input(&["3", "--no-stats"], "cmd1\ncmd2\ncmd3\ncmd4\ncmd5\n", dir.path());

    assert_eq!(code, 0, "stderr: {}", stderr);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("worker-"));
    assert!(lines[0].ends_with(" bulk: cmd1 cmd2 cmd3 "));
    assert_eq!(
        screen_bulks(&stdout),
        vec!["bulk: cmd1 cmd2 cmd3 ", "bulk: cmd4 cmd5 "]
    );
}

#[test]
fn test_blocks_override_bulk_size() {
    let dir = TempDir::new().unwrap();
    let input = "cmd1\ncmd2\n{\ncmd3\ncmd4\n{\ncmd5\n}\ncmd6\n}\ncmd7\n";
    let (stdout, _stderr, code) = run_bulkmt_with_input(&["3", "--no-stats"], input, dir.path());

    assert_eq!(code, 0);
    assert_eq!(
        screen_bulks(&stdout),
        vec![
            "bulk: cmd1 cmd2 ",
            "bulk: cmd3 cmd4 cmd5 cmd6 ",
            "bulk: cmd7 ",
        ]
    );
}

#[test]
fn test_unterminated_block_is_discarded_with_warning() {
    let dir = TempDir::new().unwrap();
    let input = "cmd1\n{\ncmd2\ncmd3\n";
    let (stdout, stderr, code) = run_bulkmt_with_input(&["2"], input, dir.path());

    assert_eq!(code, 0);
    assert_eq!(screen_bulks(&stdout), vec!["bulk: cmd1 "]);
    assert!(stderr.contains("bulkmt: Warning:"), "stderr: {}", stderr);
    assert!(stderr.contains("2 commands discarded"));
    assert!(stdout.contains("Discarded 2"));
    assert_eq!(log_contents(dir.path()), vec!["bulk: cmd1 \n"]);
}

#[test]
fn test_stats_table_lists_every_worker() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, code) =
        run_bulkmt_with_input(&["2", "--file-threads", "3"], "a\nb\nc\n", dir.path());

    assert_eq!(code, 0);
    assert!(stdout.contains("MAIN\n  Lines 3\n  Blocks 2\n  Commands 3\n"));
    assert!(stdout.contains("SCREEN\nBlocks\n"));
    assert!(stdout.contains("FILE\nBlocks\n"));

    // Idle file workers still get a zero row
    let file_section = stdout.split("FILE\n").nth(1).unwrap();
    let block_rows: Vec<&str> = file_section
        .split("Commands\n")
        .next()
        .unwrap()
        .lines()
        .filter(|l| l.contains("=>"))
        .collect();
    assert_eq!(block_rows.len(), 3);
    assert!(block_rows[0].ends_with("=> 1"));
    assert!(block_rows[1].ends_with("=> 1"));
    assert!(block_rows[2].ends_with("=> 0"));
}

#[test]
fn test_json_stats() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, code) = run_bulkmt_with_input(
        &["2", "--no-screen", "--stats-format", "json", "--file-threads", "2"],
        "a\nb\nc\nd\ne\n",
        dir.path(),
    );

    assert_eq!(code, 0);
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON stats");
    assert_eq!(report["parser"]["lines"], 5);
    assert_eq!(report["parser"]["blocks"], 3);
    assert_eq!(report["parser"]["commands"], 5);

    let sinks = report["sinks"].as_array().unwrap();
    assert_eq!(sinks.len(), 1);
    assert_eq!(sinks[0]["name"], "file");
    assert_eq!(sinks[0]["blocks"], 3);
    let workers = sinks[0]["workers"].as_array().unwrap();
    assert_eq!(workers[0]["blocks"], 2);
    assert_eq!(workers[1]["blocks"], 1);
    assert_eq!(workers[0]["commands"], 3);
    assert_eq!(workers[1]["commands"], 2);
}

#[test]
fn test_invalid_bulk_size_rejected() {
    let dir = TempDir::new().unwrap();
    for arg in ["0", "-3", "abc"] {
        let (stdout, _stderr, code) = run_bulkmt_with_input(&[arg], "a\n", dir.path());
        assert_ne!(code, 0, "bulk size {} should be rejected", arg);
        assert!(screen_bulks(&stdout).is_empty());
    }
}

#[test]
fn test_empty_input() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, code) = run_bulkmt_with_input(&["3"], "", dir.path());

    assert_eq!(code, 0);
    assert!(screen_bulks(&stdout).is_empty());
    assert!(stdout.contains("Lines 0"));
    assert!(log_contents(dir.path()).is_empty());
}

#[test]
fn test_input_file_option() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("commands.txt");
    std::fs::write(&input, "x\ny\n").unwrap();

    let (stdout, _stderr, code) = run_bulkmt_with_input(
        &["5", "--no-stats", "--no-files", "-i", input.to_str().unwrap()],
        "ignored\n",
        dir.path(),
    );

    assert_eq!(code, 0);
    assert_eq!(screen_bulks(&stdout), vec!["bulk: x y "]);
}

#[test]
fn test_custom_block_tokens() {
    let dir = TempDir::new().unwrap();
    let input = "a\nBEGIN\nb\n{\nc\nEND\nd\n";
    let (stdout, _stderr, code) = run_bulkmt_with_input(
        &[
            "5",
            "--no-stats",
            "--no-files",
            "--open-token",
            "BEGIN",
            "--close-token",
            "END",
        ],
        input,
        dir.path(),
    );

    assert_eq!(code, 0);
    assert_eq!(
        screen_bulks(&stdout),
        vec!["bulk: a ", "bulk: b { c ", "bulk: d "]
    );
}

#[test]
fn test_identical_tokens_rejected() {
    let dir = TempDir::new().unwrap();
    let (_stdout, stderr, code) = run_bulkmt_with_input(
        &["5", "--open-token", "X", "--close-token", "X"],
        "a\n",
        dir.path(),
    );

    assert_eq!(code, 2);
    assert!(stderr.contains("bulkmt: Error:"));
    assert!(stderr.contains("must differ"));
}

#[test]
fn test_crlf_input() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, code) = run_bulkmt_with_input(
        &["2", "--no-stats", "--no-files"],
        "a\r\n{\r\nb\r\n}\r\n",
        dir.path(),
    );

    assert_eq!(code, 0);
    assert_eq!(screen_bulks(&stdout), vec!["bulk: a ", "bulk: b "]);
}
