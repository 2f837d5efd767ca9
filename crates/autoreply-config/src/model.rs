// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the autoreply agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level autoreply configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutoreplyConfig {
    /// Agent identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Reply policy: switch, quotas, schedule, content filter.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Local model selection and sampling parameters.
    #[serde(default)]
    pub model: ModelConfig,

    /// Notification intake filters and queueing.
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "autoreply".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Reply policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyConfig {
    /// Master switch. Nothing is answered while this is off.
    #[serde(default)]
    pub enabled: bool,

    /// Maximum successful replies per local calendar day.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Maximum send attempts per sender in any trailing 60 seconds.
    #[serde(default = "default_per_minute_limit")]
    pub per_minute_limit: u32,

    /// First hour (0-23, local time) replies are allowed.
    #[serde(default)]
    pub work_hours_start: u32,

    /// Last hour (0-23, local time) replies are allowed, inclusive.
    #[serde(default = "default_work_hours_end")]
    pub work_hours_end: u32,

    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,

    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    /// Terms separated by `,`, `，`, `;` or newlines.
    #[serde(default)]
    pub sensitive_words: String,

    /// Returned instead of a generated reply when generation fails.
    #[serde(default = "default_reply_text")]
    pub default_reply: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            daily_limit: default_daily_limit(),
            per_minute_limit: default_per_minute_limit(),
            work_hours_start: 0,
            work_hours_end: default_work_hours_end(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            sensitive_words: String::new(),
            default_reply: default_reply_text(),
        }
    }
}

fn default_daily_limit() -> u32 {
    100
}

fn default_per_minute_limit() -> u32 {
    3
}

fn default_work_hours_end() -> u32 {
    23
}

fn default_min_delay_secs() -> u64 {
    2
}

fn default_max_delay_secs() -> u64 {
    8
}

fn default_reply_text() -> String {
    "Got it, I'll get back to you soon.".to_string()
}

/// Local model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model identifier; resolves to `<models_dir>/<selected>.gguf`.
    #[serde(default = "default_selected_model")]
    pub selected: String,

    #[serde(default = "default_models_dir")]
    pub models_dir: String,

    /// Explicit GGUF path. Takes precedence over `selected` when set.
    #[serde(default)]
    pub model_path: Option<String>,

    /// Explicit tokenizer path. Defaults to `tokenizer.json` beside the model.
    #[serde(default)]
    pub tokenizer_path: Option<String>,

    /// Inference worker threads.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Context window in tokens. Prompts are truncated to this capacity.
    #[serde(default = "default_context_length")]
    pub context_length: usize,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Sampling seed. `None` draws a fresh seed for every call.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Overrides the architecture declared in the GGUF metadata.
    #[serde(default)]
    pub architecture: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            selected: default_selected_model(),
            models_dir: default_models_dir(),
            model_path: None,
            tokenizer_path: None,
            threads: default_threads(),
            context_length: default_context_length(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            seed: None,
            architecture: None,
        }
    }
}

fn default_selected_model() -> String {
    "qwen2.5-0.5b-instruct-q4_k_m".to_string()
}

fn default_models_dir() -> String {
    data_dir().join("models").to_string_lossy().into_owned()
}

fn default_threads() -> usize {
    4
}

fn default_context_length() -> usize {
    2048
}

fn default_max_tokens() -> usize {
    128
}

fn default_temperature() -> f64 {
    0.7
}

/// Notification intake configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Package identifier of the only app whose notifications are handled.
    #[serde(default = "default_source_package")]
    pub source_package: String,

    /// Literal bodies the host substitutes for non-text messages.
    #[serde(default = "default_placeholder_markers")]
    pub placeholder_markers: Vec<String>,

    /// Titles matching this pattern are treated as group conversations.
    #[serde(default = "default_group_title_pattern")]
    pub group_title_pattern: String,

    /// Capacity of the bounded intake queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Seconds between correspondent directory refreshes from storage.
    #[serde(default = "default_directory_refresh_secs")]
    pub directory_refresh_secs: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            source_package: default_source_package(),
            placeholder_markers: default_placeholder_markers(),
            group_title_pattern: default_group_title_pattern(),
            queue_capacity: default_queue_capacity(),
            directory_refresh_secs: default_directory_refresh_secs(),
        }
    }
}

fn default_source_package() -> String {
    "com.tencent.mm".to_string()
}

fn default_placeholder_markers() -> Vec<String> {
    [
        "[图片]",
        "[语音]",
        "[视频]",
        "[文件]",
        "[位置]",
        "[动画表情]",
        "[表情]",
        "[红包]",
        "[转账]",
        "[链接]",
        "[名片]",
        "[视频通话]",
        "[语音通话]",
        "[image]",
        "[voice]",
        "[video]",
        "[file]",
        "[location]",
        "[sticker]",
        "[red packet]",
        "[transfer]",
        "[link]",
    ]
    .iter()
    .map(|m| m.to_string())
    .collect()
}

fn default_group_title_pattern() -> String {
    r"[(（]\d+[)）]\s*$".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

fn default_directory_refresh_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    data_dir()
        .join("autoreply.db")
        .to_string_lossy()
        .into_owned()
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("autoreply"))
        .unwrap_or_else(|| PathBuf::from("."))
}
