//! End-to-end tests of the `mailnorm` binary.

mod common;

use std::process::{Command, Output};

use assert_fs::prelude::*;
use predicates::prelude::*;

use common::{fixture, MsgBuilder};

fn mailnorm(home: &assert_fs::TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mailnorm"))
        .args(args)
        .env("MAILNORM_CONFIG", home.path().join("missing.toml"))
        .env("XDG_CACHE_HOME", home.path().join("cache"))
        .env_remove("RUST_LOG")
        .output()
        .expect("run mailnorm")
}

#[test]
fn test_extract_prints_json_line() {
    let home = assert_fs::TempDir::new().unwrap();
    let simple = fixture("simple.eml");
    let out = mailnorm(&home, &["extract", simple.to_str().unwrap()]);
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let record: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(record["subject"], "Budget review");
    assert_eq!(record["date"], "9-5-2017, 14:5");
}

#[test]
fn test_unsupported_file_fails() {
    let home = assert_fs::TempDir::new().unwrap();
    let notes = home.child("notes.txt");
    notes.write_str("hello").unwrap();
    let out = mailnorm(&home, &[notes.path().to_str().unwrap()]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(predicate::str::contains("Unsupported format").eval(&stderr));
}

#[test]
fn test_batch_writes_sorted_json_lines() {
    let home = assert_fs::TempDir::new().unwrap();
    let inbox = home.child("inbox");
    inbox.create_dir_all().unwrap();
    MsgBuilder::sample().write(inbox.child("a.msg").path());
    inbox
        .child("b.eml")
        .write_file(&fixture("simple.eml"))
        .unwrap();
    inbox.child("c.txt").write_str("ignored").unwrap();
    inbox.child("d.msg").write_str("not a compound file").unwrap();

    let records = home.child("out").child("records.jsonl");
    let out = mailnorm(
        &home,
        &[
            "batch",
            inbox.path().to_str().unwrap(),
            "--output",
            records.path().to_str().unwrap(),
        ],
    );
    assert!(out.status.success());

    records.assert(predicate::path::is_file());
    let text = std::fs::read_to_string(records.path()).unwrap();
    let subjects: Vec<String> = text
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["subject"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(subjects, vec!["Budget review", "Budget review"]);

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(predicate::str::contains("1 failed").eval(&stderr));
}

#[test]
fn test_streams_lists_labels() {
    let home = assert_fs::TempDir::new().unwrap();
    let msg = home.child("a.msg");
    MsgBuilder::sample().write(msg.path());

    let out = mailnorm(&home, &["streams", "--json", msg.path().to_str().unwrap()]);
    assert!(out.status.success());
    let items: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let subject = items
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["path"] == "__substg1.0_0037001F")
        .unwrap();
    assert_eq!(subject["label"], "Subject");
    assert_eq!(subject["type"], "unicode");
}

#[test]
fn test_attachments_saved() {
    let home = assert_fs::TempDir::new().unwrap();
    let msg = home.child("a.msg");
    MsgBuilder::sample().write(msg.path());
    let out_dir = home.child("files");

    let out = mailnorm(
        &home,
        &[
            "attachments",
            msg.path().to_str().unwrap(),
            "--output",
            out_dir.path().to_str().unwrap(),
        ],
    );
    assert!(out.status.success());
    out_dir.child("budget.xlsx").assert(predicate::path::is_file());
}
