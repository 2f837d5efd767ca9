// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./autoreply.toml` > `~/.config/autoreply/autoreply.toml` >
//! `/etc/autoreply/autoreply.toml`, with `AUTOREPLY_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AutoreplyConfig;

pub(crate) const SYSTEM_FILE: &str = "/etc/autoreply/autoreply.toml";
pub(crate) const LOCAL_FILE: &str = "autoreply.toml";

/// Top-level sections that environment variables may address.
const SECTIONS: &[&str] = &["agent", "reply", "model", "intake", "storage"];

/// `~/.config/autoreply/autoreply.toml`, if a config dir is known.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("autoreply").join(LOCAL_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/autoreply/autoreply.toml`
/// 3. `~/.config/autoreply/autoreply.toml`
/// 4. `./autoreply.toml`
/// 5. `AUTOREPLY_*` environment variables
pub fn load_config() -> Result<AutoreplyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AutoreplyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutoreplyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AutoreplyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutoreplyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the default lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AutoreplyConfig::default()))
        .merge(Toml::file(SYSTEM_FILE))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_FILE))
        .merge(env_provider())
}

/// Environment provider with an explicit section-to-dot mapping.
///
/// `Env::split("_")` would break keys that contain underscores:
/// `AUTOREPLY_REPLY_DAILY_LIMIT` must become `reply.daily_limit`.
fn env_provider() -> Env {
    Env::prefixed("AUTOREPLY_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
