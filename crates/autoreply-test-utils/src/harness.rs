// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles the full reply pipeline with a scripted model,
//! a temp SQLite database and permissive policy defaults (enabled, all-day
//! work hours, no delay). `process()` drives one notification through
//! extraction, the gate, generation, delivery and logging.

use std::sync::Arc;

use autoreply_agent::{Admission, Pipeline, ReplyDelay};
use autoreply_config::model::{AutoreplyConfig, StorageConfig};
use autoreply_core::{AutoreplyError, Correspondent, NotificationEvent, OutcomeLogEntry, StorageAdapter};
use autoreply_engine::{InferenceEngine, ModelStore, ReplyGenerator};
use autoreply_policy::RejectReason;
use autoreply_storage::SqliteStorage;

use crate::mock_action::{notification, MockAction};
use crate::scripted::{ScriptedLoader, SessionProbe};

const TEST_MODEL: &str = "test-model";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    loader: ScriptedLoader,
    correspondents: Vec<(String, String)>,
    config: AutoreplyConfig,
    load_model: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = AutoreplyConfig::default();
        config.reply.enabled = true;
        config.reply.work_hours_start = 0;
        config.reply.work_hours_end = 23;
        config.reply.min_delay_secs = 0;
        config.reply.max_delay_secs = 0;
        config.model.selected = TEST_MODEL.to_string();
        config.model.seed = Some(42);
        Self {
            loader: ScriptedLoader::default(),
            correspondents: Vec::new(),
            config,
            load_model: true,
        }
    }

    /// Replies the scripted model produces, in order.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.loader = ScriptedLoader::new(responses);
        self
    }

    /// Uses a preconfigured loader (failure injection, delays).
    pub fn with_loader(mut self, loader: ScriptedLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Whitelists a correspondent before the pipeline starts.
    pub fn with_correspondent(mut self, name: &str, style: &str) -> Self {
        self.correspondents.push((name.to_string(), style.to_string()));
        self
    }

    /// Adjusts the configuration before the pipeline is built.
    pub fn with_config(mut self, edit: impl FnOnce(&mut AutoreplyConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Leaves the engine unloaded.
    pub fn without_model(mut self) -> Self {
        self.load_model = false;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, AutoreplyError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| AutoreplyError::Storage { source: e.into() })?;

        let mut config = self.config;
        let models_dir = temp_dir.path().join("models");
        std::fs::create_dir_all(&models_dir)
            .map_err(|e| AutoreplyError::Storage { source: e.into() })?;
        for file in [format!("{TEST_MODEL}.gguf"), "tokenizer.json".to_string()] {
            std::fs::write(models_dir.join(file), b"")
                .map_err(|e| AutoreplyError::Storage { source: e.into() })?;
        }
        config.model.models_dir = models_dir.to_string_lossy().into_owned();
        config.storage = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
        for (name, style) in &self.correspondents {
            storage
                .upsert_correspondent(&Correspondent::new(name.as_str(), style.as_str()))
                .await?;
        }

        let probe = self.loader.probe();
        let engine = Arc::new(InferenceEngine::new(Arc::new(self.loader.clone())));
        let generator = Arc::new(ReplyGenerator::new(
            engine,
            ModelStore::from_config(&config.model),
            config.model.clone(),
            config.reply.default_reply.clone(),
        ));
        if self.load_model {
            generator.initialize().await?;
        }

        let pipeline = Pipeline::open(&config, Arc::clone(&storage), generator)
            .await?
            .with_delay(ReplyDelay::none());

        Ok(TestHarness {
            pipeline: Arc::new(pipeline),
            storage,
            loader: self.loader,
            probe,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// What happened to one notification pushed through the harness.
#[derive(Debug)]
pub enum Processed {
    Ignored,
    Rejected(RejectReason),
    Replied(OutcomeLogEntry),
}

impl Processed {
    pub fn entry(&self) -> Option<&OutcomeLogEntry> {
        match self {
            Processed::Replied(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Processed::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// A complete test environment with a scripted model and temp storage.
pub struct TestHarness {
    pub pipeline: Arc<Pipeline>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    /// The loader behind the engine; push more replies through it.
    pub loader: ScriptedLoader,
    pub probe: Arc<SessionProbe>,
    pub config: AutoreplyConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Admits `event` and, if accepted, runs the reply worker to completion.
    pub async fn process(&self, event: &NotificationEvent) -> Processed {
        match self.pipeline.admit(event).await {
            Admission::Ignored => Processed::Ignored,
            Admission::Rejected(reason) => Processed::Rejected(reason),
            Admission::Accepted(job) => Processed::Replied(self.pipeline.reply(job).await),
        }
    }

    /// Sends a one-to-one text message from `sender` and returns the outcome
    /// together with the action the reply went to.
    pub async fn send_message(&self, sender: &str, text: &str) -> (Processed, Arc<MockAction>) {
        let action = Arc::new(MockAction::new());
        let event = notification(sender, text, Arc::clone(&action));
        (self.process(&event).await, action)
    }

    pub async fn outcomes(&self) -> Vec<OutcomeLogEntry> {
        self.pipeline.outcomes().entries().await
    }
}
