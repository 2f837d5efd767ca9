// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! autoreply - offline chat auto-reply agent.
//!
//! This is the binary entry point. `serve` runs the reply pipeline over a
//! JSON-lines stdio bridge; the other subcommands edit persisted state.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod contacts;
mod host;
mod logs;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use autoreply_config::AutoreplyConfig;
use autoreply_core::{AutoreplyError, StorageAdapter};
use autoreply_storage::SqliteStorage;
use clap::{Parser, Subcommand};

/// autoreply - answers chat notifications with a local language model.
#[derive(Parser, Debug)]
#[command(name = "autoreply", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the reply pipeline over stdin/stdout JSON lines.
    Serve,
    /// Manage whitelisted correspondents.
    Contacts {
        #[command(subcommand)]
        action: ContactsCommand,
    },
    /// Inspect or clear the outcome log.
    Logs {
        #[command(subcommand)]
        action: LogsCommand,
    },
    /// Inspect or clear a correspondent's conversation window.
    Context {
        #[command(subcommand)]
        action: ContextCommand,
    },
    /// Configuration utilities.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ContactsCommand {
    /// List correspondents.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Whitelist a correspondent.
    Add {
        name: String,
        /// Reply style, e.g. "short and teasing".
        #[arg(long, default_value = "")]
        style: String,
    },
    /// Enable replies to a correspondent (by id or name).
    Enable { key: String },
    /// Disable replies to a correspondent (by id or name).
    Disable { key: String },
    /// Change a correspondent's reply style.
    Style { key: String, style: String },
    /// Remove a correspondent and its conversation window.
    Remove { key: String },
}

#[derive(Subcommand, Debug)]
enum LogsCommand {
    /// Show recent outcomes, newest first.
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Delete every outcome entry.
    Clear,
}

#[derive(Subcommand, Debug)]
enum ContextCommand {
    /// Print a correspondent's conversation window.
    Show { key: String },
    /// Empty a correspondent's conversation window.
    Clear { key: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration, storage and model files.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => autoreply_config::load_and_validate_path(path),
        None => autoreply_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            autoreply_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    if matches!(cli.command, Some(Commands::Serve)) {
        limit_compute_threads(config.model.threads);
    }
    init_tracing(&config.agent.log_level);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("autoreply: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(dispatch(cli.command, config));
    // Stdin reads may still be parked on a blocking thread.
    runtime.shutdown_timeout(Duration::from_secs(1));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("autoreply: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Option<Commands>, config: AutoreplyConfig) -> Result<(), AutoreplyError> {
    match command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Contacts { action }) => match action {
            ContactsCommand::List { json } => contacts::list(&config, json).await,
            ContactsCommand::Add { name, style } => contacts::add(&config, &name, &style).await,
            ContactsCommand::Enable { key } => contacts::set_enabled(&config, &key, true).await,
            ContactsCommand::Disable { key } => contacts::set_enabled(&config, &key, false).await,
            ContactsCommand::Style { key, style } => {
                contacts::set_style(&config, &key, &style).await
            }
            ContactsCommand::Remove { key } => contacts::remove(&config, &key).await,
        },
        Some(Commands::Logs { action }) => match action {
            LogsCommand::List { limit, json, plain } => logs::list(&config, limit, json, plain).await,
            LogsCommand::Clear => logs::clear(&config).await,
        },
        Some(Commands::Context { action }) => match action {
            ContextCommand::Show { key } => contacts::show_context(&config, &key).await,
            ContextCommand::Clear { key } => contacts::clear_context(&config, &key).await,
        },
        Some(Commands::Config {
            action: ConfigCommand::Check { plain },
        }) => check::run_check(&config, plain).await,
        None => {
            println!("autoreply: use --help for available commands");
            Ok(())
        }
    }
}

/// Opens and migrates the configured database for a one-shot command.
async fn open_storage(config: &AutoreplyConfig) -> Result<Arc<SqliteStorage>, AutoreplyError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Caps the CPU thread pool used for inference. Must run before any thread
/// is spawned; the pool size cannot change afterwards.
fn limit_compute_threads(threads: usize) {
    if let Some(value) = compute_threads_override(threads, std::env::var_os("RAYON_NUM_THREADS")) {
        // SAFETY: called from `main` before the runtime or any other thread exists.
        unsafe { std::env::set_var("RAYON_NUM_THREADS", value) };
    }
}

/// The `RAYON_NUM_THREADS` value to set, unless the user already set one.
fn compute_threads_override(threads: usize, existing: Option<std::ffi::OsString>) -> Option<String> {
    match existing {
        Some(_) => None,
        None => Some(threads.max(1).to_string()),
    }
}

/// Logs go to stderr; stdout carries the reply channel in `serve`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("autoreply={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
