// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves the selected model to files on disk.
//!
//! Models live at `<models_dir>/<selected>.gguf` with a `tokenizer.json`
//! next to them, either `<selected>.tokenizer.json` or a shared one.
//! Acquiring the files is the host's job.

use std::path::{Path, PathBuf};

use autoreply_config::model::ModelConfig;
use autoreply_core::error::AutoreplyError;

use crate::session::LoadSpec;

const TOKENIZER_FILE: &str = "tokenizer.json";

/// Path resolution for local model files.
#[derive(Debug, Clone)]
pub struct ModelStore {
    models_dir: PathBuf,
    selected: String,
    model_override: Option<PathBuf>,
    tokenizer_override: Option<PathBuf>,
}

impl ModelStore {
    pub fn new(models_dir: impl Into<PathBuf>, selected: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            selected: selected.into(),
            model_override: None,
            tokenizer_override: None,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            models_dir: PathBuf::from(&config.models_dir),
            selected: config.selected.clone(),
            model_override: config.model_path.as_ref().map(PathBuf::from),
            tokenizer_override: config.tokenizer_path.as_ref().map(PathBuf::from),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_override
            .clone()
            .unwrap_or_else(|| self.models_dir.join(format!("{}.gguf", self.selected)))
    }

    /// The tokenizer for the current model.
    ///
    /// Prefers `<stem>.tokenizer.json` beside the model, then `tokenizer.json`.
    pub fn tokenizer_path(&self) -> PathBuf {
        if let Some(path) = &self.tokenizer_override {
            return path.clone();
        }
        let model = self.model_path();
        let dir = model.parent().map(Path::to_path_buf).unwrap_or_default();
        if let Some(stem) = model.file_stem().and_then(|s| s.to_str()) {
            let specific = dir.join(format!("{stem}.{TOKENIZER_FILE}"));
            if specific.exists() {
                return specific;
            }
        }
        dir.join(TOKENIZER_FILE)
    }

    pub fn is_available(&self) -> bool {
        self.model_path().is_file() && self.tokenizer_path().is_file()
    }

    /// Builds a [`LoadSpec`], failing if either file is missing.
    pub fn load_spec(&self, config: &ModelConfig) -> Result<LoadSpec, AutoreplyError> {
        let model_path = self.model_path();
        if !model_path.is_file() {
            return Err(AutoreplyError::load(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }
        let tokenizer_path = self.tokenizer_path();
        if !tokenizer_path.is_file() {
            return Err(AutoreplyError::load(format!(
                "tokenizer not found: {}",
                tokenizer_path.display()
            )));
        }
        Ok(LoadSpec {
            model_path,
            tokenizer_path,
            context_length: config.context_length,
            architecture: config.architecture.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_under_models_dir() {
        let store = ModelStore::new("/data/models", "qwen-small");
        assert_eq!(store.model_path(), PathBuf::from("/data/models/qwen-small.gguf"));
        assert_eq!(
            store.tokenizer_path(),
            PathBuf::from("/data/models/tokenizer.json")
        );
    }

    #[test]
    fn explicit_path_wins() {
        let config = ModelConfig {
            model_path: Some("/opt/m/custom.gguf".into()),
            ..ModelConfig::default()
        };
        let store = ModelStore::from_config(&config);
        assert_eq!(store.model_path(), PathBuf::from("/opt/m/custom.gguf"));
        assert_eq!(store.tokenizer_path(), PathBuf::from("/opt/m/tokenizer.json"));
    }

    #[test]
    fn missing_files_are_load_errors() {
        let store = ModelStore::new("/nonexistent/models", "x");
        assert!(!store.is_available());
        let err = store.load_spec(&ModelConfig::default()).unwrap_err();
        assert!(matches!(err, AutoreplyError::Load { .. }));
    }

    #[test]
    fn model_specific_tokenizer_preferred() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m.gguf"), b"x").unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("m.tokenizer.json"), b"{}").unwrap();
        let store = ModelStore::new(dir.path(), "m");
        assert_eq!(store.tokenizer_path(), dir.path().join("m.tokenizer.json"));
        assert!(store.is_available());

        let spec = store.load_spec(&ModelConfig::default()).unwrap();
        assert_eq!(spec.model_path, dir.path().join("m.gguf"));
        assert_eq!(spec.context_length, 2048);
    }
}
