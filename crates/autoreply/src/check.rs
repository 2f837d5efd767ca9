// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `autoreply config check` command implementation.
//!
//! Verifies that configuration, storage and model files are usable before
//! `serve` is started.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use autoreply_config::AutoreplyConfig;
use autoreply_core::{AutoreplyError, HealthStatus, PluginAdapter, StorageAdapter};
use autoreply_engine::ModelStore;
use autoreply_policy::MessageExtractor;
use autoreply_storage::SqliteStorage;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Runs all checks and prints a report. Fails if any check failed.
pub async fn run_check(config: &AutoreplyConfig, plain: bool) -> Result<(), AutoreplyError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = vec![
        check_intake(config),
        check_reply(config),
        check_database(&config.storage.database_path, config).await,
        check_model(config),
    ];

    println!();
    println!("  autoreply config check");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", render(result, use_color));
    }
    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    if fail_count > 0 {
        return Err(AutoreplyError::Config(format!("{fail_count} check(s) failed")));
    }
    Ok(())
}

fn render(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!("    {symbol} {:<16} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<16} {} ({duration_ms}ms)", result.name, result.message)
    }
}

/// The group-title pattern must compile.
fn check_intake(config: &AutoreplyConfig) -> CheckResult {
    let start = Instant::now();
    match MessageExtractor::from_config(&config.intake) {
        Ok(_) => CheckResult::new(
            "Intake",
            CheckStatus::Pass,
            format!("watching {}", config.intake.source_package),
            start,
        ),
        Err(e) => CheckResult::new("Intake", CheckStatus::Fail, e.to_string(), start),
    }
}

fn check_reply(config: &AutoreplyConfig) -> CheckResult {
    let start = Instant::now();
    let reply = &config.reply;
    if reply.enabled {
        CheckResult::new(
            "Replies",
            CheckStatus::Pass,
            format!(
                "enabled, {} per day, {} per minute",
                reply.daily_limit, reply.per_minute_limit
            ),
            start,
        )
    } else {
        CheckResult::new(
            "Replies",
            CheckStatus::Warn,
            "disabled (set reply.enabled = true)",
            start,
        )
    }
}

async fn check_database(db_path: &str, config: &AutoreplyConfig) -> CheckResult {
    let start = Instant::now();
    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let storage = SqliteStorage::new(config.storage.clone());
    if let Err(e) = storage.initialize().await {
        return CheckResult::new("Database", CheckStatus::Fail, format!("open failed: {e}"), start);
    }
    let health = storage.health_check().await;
    let _ = storage.close().await;
    match health {
        Ok(HealthStatus::Healthy) => {
            CheckResult::new("Database", CheckStatus::Pass, "connected", start)
        }
        Ok(other) => CheckResult::new("Database", CheckStatus::Warn, format!("{other:?}"), start),
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, format!("query failed: {e}"), start),
    }
}

/// Both the weights and the tokenizer must be present.
fn check_model(config: &AutoreplyConfig) -> CheckResult {
    let start = Instant::now();
    let store = ModelStore::from_config(&config.model);
    match store.load_spec(&config.model) {
        Ok(spec) => CheckResult::new(
            "Model",
            CheckStatus::Pass,
            spec.model_path.display().to_string(),
            start,
        ),
        Err(e) => CheckResult::new("Model", CheckStatus::Fail, e.to_string(), start),
    }
}
