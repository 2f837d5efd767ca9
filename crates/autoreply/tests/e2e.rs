// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests that drive the compiled binary.
//!
//! Each test writes its own config into a temp directory so the database and
//! model directory never touch the user's files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

struct Workspace {
    dir: tempfile::TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new(extra: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("state").join("autoreply.db");
        let models = dir.path().join("models");
        let config = dir.path().join("autoreply.toml");
        let body = format!(
            "[storage]\ndatabase_path = {db:?}\n\n[model]\nmodels_dir = {models:?}\n\n{extra}",
            db = db.to_string_lossy(),
            models = models.to_string_lossy(),
        );
        std::fs::write(&config, body).expect("write config");
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autoreply"));
        cmd.arg("--config")
            .arg(&self.config)
            .args(args)
            .current_dir(self.path())
            .env("AUTOREPLY_AGENT_LOG_LEVEL", "warn")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run autoreply")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn config_check_reports_missing_model() {
    let ws = Workspace::new("");
    let output = ws.run(&["config", "check", "--plain"]);

    assert!(!output.status.success(), "stdout: {}", stdout(&output));
    let text = stdout(&output);
    assert!(text.contains("[FAIL] Model"), "stdout: {text}");
    assert!(text.contains("[WARN] Replies"), "stdout: {text}");
}

#[test]
fn config_check_rejects_unknown_keys() {
    let ws = Workspace::new("[reply]\nenabeld = true\n");
    let output = ws.run(&["config", "check"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("enabeld"), "stderr: {}", stderr(&output));
}

#[test]
fn contacts_round_trip() {
    let ws = Workspace::new("");

    let added = ws.run(&["contacts", "add", "Alice", "--style", "warm and brief"]);
    assert!(added.status.success(), "stderr: {}", stderr(&added));
    assert!(stdout(&added).contains("Added Alice"));

    let disabled = ws.run(&["contacts", "disable", "alice"]);
    assert!(disabled.status.success(), "stderr: {}", stderr(&disabled));

    let listed = ws.run(&["contacts", "list", "--json"]);
    assert!(listed.status.success(), "stderr: {}", stderr(&listed));
    let json: serde_json::Value = serde_json::from_slice(&listed.stdout).expect("json list");
    let all = json.as_array().expect("array");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["name"], "Alice");
    assert_eq!(all[0]["style"], "warm and brief");
    assert_eq!(all[0]["enabled"], false);

    let removed = ws.run(&["contacts", "remove", "Alice"]);
    assert!(removed.status.success(), "stderr: {}", stderr(&removed));

    let listed = ws.run(&["contacts", "list", "--json"]);
    let json: serde_json::Value = serde_json::from_slice(&listed.stdout).expect("json list");
    assert!(json.as_array().expect("array").is_empty());
}

#[test]
fn unknown_contact_fails() {
    let ws = Workspace::new("");
    let output = ws.run(&["context", "show", "nobody"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no correspondent matches"));
}

#[test]
fn empty_logs_list_and_clear() {
    let ws = Workspace::new("");

    let listed = ws.run(&["logs", "list", "--json"]);
    assert!(listed.status.success(), "stderr: {}", stderr(&listed));
    let json: serde_json::Value = serde_json::from_slice(&listed.stdout).expect("json logs");
    assert!(json.as_array().expect("array").is_empty());

    let cleared = ws.run(&["logs", "clear"]);
    assert!(cleared.status.success(), "stderr: {}", stderr(&cleared));
}

#[test]
fn serve_without_model_exits_cleanly_on_eof() {
    let ws = Workspace::new("[reply]\nenabled = true\n");
    assert!(ws.run(&["contacts", "add", "Alice"]).status.success());

    let mut child = ws
        .command(&["serve"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn serve");
    {
        let mut stdin = child.stdin.take().expect("stdin");
        writeln!(
            stdin,
            r#"{{"source":"com.tencent.mm","title":"Alice","body":"hi","actions":[{{"key":"reply","inputs":["reply_text"]}}]}}"#
        )
        .expect("write notification");
    }
    let output = child.wait_with_output().expect("wait serve");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).trim().is_empty(), "stdout: {}", stdout(&output));
}
