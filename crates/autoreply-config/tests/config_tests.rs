// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the autoreply configuration system.

use autoreply_config::diagnostic::ConfigError;
use autoreply_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "desk-phone"
log_level = "debug"

[reply]
enabled = true
daily_limit = 20
per_minute_limit = 2
work_hours_start = 9
work_hours_end = 21
min_delay_secs = 1
max_delay_secs = 3
sensitive_words = "loan，password;bank"
default_reply = "busy now"

[model]
selected = "tiny"
models_dir = "/opt/models"
threads = 2
context_length = 1024
max_tokens = 64
temperature = 0.5
seed = 7
architecture = "qwen2"

[intake]
source_package = "org.example.chat"
placeholder_markers = ["[photo]"]
group_title_pattern = "\\(\\d+\\)$"
queue_capacity = 8
directory_refresh_secs = 5

[storage]
database_path = "/tmp/autoreply-test.db"
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.agent.name, "desk-phone");
    assert!(config.reply.enabled);
    assert_eq!(config.reply.daily_limit, 20);
    assert_eq!(config.reply.sensitive_words, "loan，password;bank");
    assert_eq!(config.model.seed, Some(7));
    assert_eq!(config.model.architecture.as_deref(), Some("qwen2"));
    assert_eq!(config.intake.placeholder_markers, vec!["[photo]"]);
    assert_eq!(config.intake.queue_capacity, 8);
    assert_eq!(config.storage.database_path, "/tmp/autoreply-test.db");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("defaults");
    assert!(!config.reply.enabled);
    assert_eq!(config.reply.per_minute_limit, 3);
}

#[test]
fn typo_produces_unknown_key_with_suggestion() {
    let errors = load_and_validate_str("[reply]\ndaily_limt = 5\n").unwrap_err();
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, .. }
            if key == "daily_limt" && suggestion.as_deref() == Some("daily_limit"))
    });
    assert!(found, "expected suggestion, got {errors:?}");
}

#[test]
fn wrong_type_produces_invalid_type() {
    let errors = load_and_validate_str("[model]\nthreads = \"many\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("threads"))),
        "got {errors:?}"
    );
}

#[test]
fn semantic_violations_are_reported() {
    let errors = load_and_validate_str("[reply]\nwork_hours_start = 30\n").unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("work_hours_start"))));
}
