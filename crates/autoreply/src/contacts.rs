// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `autoreply contacts` and `autoreply context` commands.

use std::sync::Arc;

use autoreply_agent::CorrespondentDirectory;
use autoreply_config::AutoreplyConfig;
use autoreply_core::{AutoreplyError, Correspondent, StorageAdapter};

use crate::open_storage;

/// Runs `f` against a freshly loaded directory, closing storage afterwards.
async fn with_directory<T, F, Fut>(config: &AutoreplyConfig, f: F) -> Result<T, AutoreplyError>
where
    F: FnOnce(Arc<dyn StorageAdapter>, CorrespondentDirectory) -> Fut,
    Fut: std::future::Future<Output = Result<T, AutoreplyError>>,
{
    let storage: Arc<dyn StorageAdapter> = open_storage(config).await?;
    let directory = CorrespondentDirectory::new(Arc::clone(&storage));
    let result = match directory.refresh().await {
        Ok(_) => f(Arc::clone(&storage), directory).await,
        Err(e) => Err(e),
    };
    storage.close().await?;
    result
}

fn lookup(directory: &CorrespondentDirectory, key: &str) -> Result<Correspondent, AutoreplyError> {
    directory
        .find(key)
        .ok_or_else(|| AutoreplyError::Config(format!("no correspondent matches '{key}'")))
}

/// Prints correspondents as a table or JSON array.
pub async fn list(config: &AutoreplyConfig, json: bool) -> Result<(), AutoreplyError> {
    let all = with_directory(config, |_, directory| async move {
        Ok(directory.snapshot())
    })
    .await?;

    if json {
        let out = serde_json::to_string_pretty(all.as_slice())
            .map_err(|e| AutoreplyError::Internal(format!("failed to encode correspondents: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    if all.is_empty() {
        println!("No correspondents. Add one with `autoreply contacts add <name>`.");
        return Ok(());
    }
    println!("{:<36}  {:<20}  {:<8}  STYLE", "ID", "NAME", "ENABLED");
    for c in all.iter() {
        println!(
            "{:<36}  {:<20}  {:<8}  {}",
            c.id,
            c.name,
            if c.enabled { "yes" } else { "no" },
            c.style
        );
    }
    Ok(())
}

pub async fn add(config: &AutoreplyConfig, name: &str, style: &str) -> Result<(), AutoreplyError> {
    let added = with_directory(config, |_, directory| async move {
        directory.add(name, style).await
    })
    .await?;
    println!("Added {} ({})", added.name, added.id);
    Ok(())
}

pub async fn set_enabled(
    config: &AutoreplyConfig,
    key: &str,
    enabled: bool,
) -> Result<(), AutoreplyError> {
    let updated = with_directory(config, |_, directory| async move {
        directory.set_enabled(key, enabled).await
    })
    .await?;
    let state = if updated.enabled { "enabled" } else { "disabled" };
    println!("{} is now {state}", updated.name);
    Ok(())
}

pub async fn set_style(config: &AutoreplyConfig, key: &str, style: &str) -> Result<(), AutoreplyError> {
    let updated = with_directory(config, |_, directory| async move {
        directory.set_style(key, style).await
    })
    .await?;
    println!("Style for {} set to \"{}\"", updated.name, updated.style);
    Ok(())
}

pub async fn remove(config: &AutoreplyConfig, key: &str) -> Result<(), AutoreplyError> {
    let removed = with_directory(config, |_, directory| async move {
        directory.remove(key).await
    })
    .await?;
    println!("Removed {}", removed.name);
    Ok(())
}

/// Prints a correspondent's stored conversation window, oldest first.
pub async fn show_context(config: &AutoreplyConfig, key: &str) -> Result<(), AutoreplyError> {
    let (correspondent, turns) = with_directory(config, |storage, directory| async move {
        let correspondent = lookup(&directory, key)?;
        let turns = storage.load_turns(&correspondent.id).await?;
        Ok((correspondent, turns))
    })
    .await?;

    if turns.is_empty() {
        println!("No conversation stored for {}.", correspondent.name);
        return Ok(());
    }
    for turn in &turns {
        println!(
            "[{}] {:<9} {}",
            turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
            turn.role.as_str(),
            turn.text
        );
    }
    Ok(())
}

pub async fn clear_context(config: &AutoreplyConfig, key: &str) -> Result<(), AutoreplyError> {
    let correspondent = with_directory(config, |storage, directory| async move {
        let correspondent = lookup(&directory, key)?;
        storage.clear_turns(&correspondent.id).await?;
        Ok(correspondent)
    })
    .await?;
    println!("Cleared conversation for {}", correspondent.name);
    Ok(())
}
