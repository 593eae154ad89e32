use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn checklistgen(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("checklistgen").expect("binary");
    cmd.env_remove("CHECKLISTGEN_API_KEY")
        .arg("--config")
        .arg(dir.join("checklistgen.toml"))
        .arg("--db")
        .arg(dir.join("checklistgen.db"));
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = tempdir().unwrap();
    checklistgen(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("prompt"))
        .stdout(predicate::str::contains("cache-stats"));
}

#[test]
fn test_short_prompt_is_bad_input() {
    let dir = tempdir().unwrap();
    checklistgen(dir.path())
        .args(["prompt", "a b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bad input"));
}

#[test]
fn test_direct_text_too_short_is_bad_input() {
    let dir = tempdir().unwrap();
    checklistgen(dir.path())
        .args(["text", "-", "--direct"])
        .write_stdin("only a handful of words here")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bad input"));
}

#[test]
fn test_unsupported_document_type() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan.docx");
    std::fs::write(&scan, b"PK\x03\x04").unwrap();

    checklistgen(dir.path())
        .arg("document")
        .arg(&scan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_cache_stats_on_fresh_database() {
    let dir = tempdir().unwrap();
    let output = checklistgen(dir.path())
        .args(["--format", "json", "cache-stats"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["documents"], 0);
    assert_eq!(stats["checklists"], 0);
    assert!(dir.path().join("checklistgen.db").exists());
}

#[test]
fn test_show_unknown_checklist_fails() {
    let dir = tempdir().unwrap();
    checklistgen(dir.path())
        .args(["show", "missing-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Checklist not found"));
}

#[test]
fn test_config_reset_then_show() {
    let dir = tempdir().unwrap();
    checklistgen(dir.path())
        .args(["config", "--reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reset to defaults"));
    assert!(dir.path().join("checklistgen.toml").exists());

    checklistgen(dir.path())
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Combined ceiling: 15"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("checklistgen.toml"),
        "[chunking]\nchunk_size = 100\nchunk_overlap = 200\n",
    )
    .unwrap();

    checklistgen(dir.path())
        .arg("cache-stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk_overlap"));
}

#[test]
fn test_refine_blank_team_is_bad_input() {
    let dir = tempdir().unwrap();
    checklistgen(dir.path())
        .args(["refine", "On-page SEO", "--team", "  ", "--prompt-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bad input"));
}

#[test]
fn test_unreachable_backend_exits_retryable() {
    let dir = tempdir().unwrap();
    let closed = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    std::fs::write(
        dir.path().join("checklistgen.toml"),
        format!("[llm]\nendpoint = \"http://{}\"\ntimeout_secs = 5\n", closed),
    )
    .unwrap();

    checklistgen(dir.path())
        .args(["prompt", "Plan a team offsite"])
        .assert()
        .code(75)
        .stderr(predicate::str::contains("please try again"));
}
