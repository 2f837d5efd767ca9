// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `autoreply logs` commands.

use std::io::IsTerminal;

use autoreply_config::AutoreplyConfig;
use autoreply_core::{AutoreplyError, OutcomeLogEntry, StorageAdapter};
use chrono::Local;

use crate::open_storage;

/// Prints up to `limit` outcomes, newest first.
pub async fn list(
    config: &AutoreplyConfig,
    limit: usize,
    json: bool,
    plain: bool,
) -> Result<(), AutoreplyError> {
    let storage = open_storage(config).await?;
    let loaded = storage.load_outcomes(limit).await;
    storage.close().await?;
    let entries = loaded?;

    if json {
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| AutoreplyError::Internal(format!("failed to encode outcomes: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No replies logged yet.");
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    for entry in &entries {
        println!("{}", format_entry(entry, use_color));
    }
    Ok(())
}

pub async fn clear(config: &AutoreplyConfig) -> Result<(), AutoreplyError> {
    let storage = open_storage(config).await?;
    let cleared = storage.clear_outcomes().await;
    storage.close().await?;
    cleared?;
    println!("Outcome log cleared.");
    Ok(())
}

fn format_entry(entry: &OutcomeLogEntry, use_color: bool) -> String {
    let when = entry
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    let status = match (entry.success, use_color) {
        (true, true) => {
            use colored::Colorize;
            "✓".green().to_string()
        }
        (false, true) => {
            use colored::Colorize;
            "✗".red().to_string()
        }
        (true, false) => "[OK]  ".to_string(),
        (false, false) => "[FAIL]".to_string(),
    };
    format!(
        "{status} {when}  {}\n    < {}\n    > {}",
        entry.sender_name, entry.received_text, entry.replied_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_format_marks_status() {
        let ok = OutcomeLogEntry::succeeded("Alice", "hi", "hello");
        let line = format_entry(&ok, false);
        assert!(line.starts_with("[OK]"));
        assert!(line.contains("Alice"));
        assert!(line.contains("< hi"));
        assert!(line.contains("> hello"));

        let failed = OutcomeLogEntry::failed("Bob", "yo", "[delivery failed: closed]");
        assert!(format_entry(&failed, false).starts_with("[FAIL]"));
    }
}
