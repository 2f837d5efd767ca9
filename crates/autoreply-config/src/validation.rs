// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: hour ranges, ordered
//! delay bounds, positive limits and a compilable group-title pattern.

use crate::diagnostic::ConfigError;
use crate::model::AutoreplyConfig;

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &AutoreplyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let reply = &config.reply;
    let model = &config.model;

    for (key, hour) in [
        ("work_hours_start", reply.work_hours_start),
        ("work_hours_end", reply.work_hours_end),
    ] {
        if hour > 23 {
            errors.push(ConfigError::validation(format!(
                "reply.{key} must be between 0 and 23, got {hour}"
            )));
        }
    }

    if reply.min_delay_secs > reply.max_delay_secs {
        errors.push(ConfigError::validation(format!(
            "reply.min_delay_secs ({}) must not exceed reply.max_delay_secs ({})",
            reply.min_delay_secs, reply.max_delay_secs
        )));
    }

    if reply.per_minute_limit < 1 {
        errors.push(ConfigError::validation(
            "reply.per_minute_limit must be at least 1",
        ));
    }

    if model.context_length < 64 {
        errors.push(ConfigError::validation(format!(
            "model.context_length must be at least 64, got {}",
            model.context_length
        )));
    }

    if model.max_tokens < 1 {
        errors.push(ConfigError::validation("model.max_tokens must be at least 1"));
    }

    if model.threads < 1 {
        errors.push(ConfigError::validation("model.threads must be at least 1"));
    }

    if model.temperature.is_nan() || model.temperature < 0.0 {
        errors.push(ConfigError::validation(format!(
            "model.temperature must be non-negative, got {}",
            model.temperature
        )));
    }

    if config.intake.queue_capacity < 1 {
        errors.push(ConfigError::validation(
            "intake.queue_capacity must be at least 1",
        ));
    }

    if let Err(e) = regex::Regex::new(&config.intake.group_title_pattern) {
        errors.push(ConfigError::validation(format!(
            "intake.group_title_pattern is not a valid regex: {e}"
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
