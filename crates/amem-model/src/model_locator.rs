//! Model locator for runtime path resolution.
//!
//! Embedding models are disk assets; nothing is downloaded at runtime.
//!
//! # Search Order
//!
//! 1. `$AMEM_MODELS_DIR`
//! 2. `~/.amem/models`
//! 3. `{exe_dir}/models`
//!
//! # Model Layout
//!
//! ```text
//! {models_dir}/
//!   embeddings/
//!     all-MiniLM-L6-v2/
//!       config.json
//!       model.safetensors
//!       tokenizer.json
//! ```
//!
//! A flat `{models_dir}/all-MiniLM-L6-v2` or Hugging Face style
//! `{models_dir}/sentence-transformers/all-MiniLM-L6-v2` layout is accepted too.

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ModelError, ModelResult};

/// Environment variable for overriding the models directory.
pub const AMEM_MODELS_DIR_ENV: &str = "AMEM_MODELS_DIR";

/// Subdirectory holding embedding models.
pub const EMBEDDINGS_SUBDIR: &str = "embeddings";

/// Default embedding model name (short form).
pub const DEFAULT_EMBEDDING_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Required files for a valid model directory.
pub const REQUIRED_MODEL_FILES: &[&str] = &["config.json", "model.safetensors", "tokenizer.json"];

/// Short name of a model id.
///
/// `"sentence-transformers/all-MiniLM-L6-v2"` → `"all-MiniLM-L6-v2"`
pub fn model_short_name(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}

/// Locates model directories using a fixed search order.
#[derive(Debug, Clone, Default)]
pub struct ModelLocator {
    /// Pinned base directory; bypasses the search order when set.
    base_dir: Option<PathBuf>,
}

impl ModelLocator {
    /// Create a locator using the default search order.
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Create a locator pinned to one base directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Candidate base directories, in priority order.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        if let Some(base) = &self.base_dir {
            return vec![base.clone()];
        }

        let mut dirs_list = Vec::new();
        if let Ok(env_path) = env::var(AMEM_MODELS_DIR_ENV) {
            if !env_path.is_empty() {
                dirs_list.push(PathBuf::from(env_path));
            }
        }
        if let Some(home) = dirs::home_dir() {
            dirs_list.push(home.join(".amem").join("models"));
        }
        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            dirs_list.push(exe_dir.join("models"));
        }
        dirs_list
    }

    /// First existing directory from [`search_dirs`](Self::search_dirs).
    pub fn resolve_base_dir(&self) -> ModelResult<PathBuf> {
        let searched = self.search_dirs();
        match searched.iter().find(|p| p.is_dir()) {
            Some(found) => {
                debug!("Models directory resolved to {:?}", found);
                Ok(found.clone())
            }
            None => Err(ModelError::ModelsDirectoryNotFound { searched }),
        }
    }

    /// Resolve the directory of an embedding model by full id or short name.
    pub fn embedding_model_path(&self, model_id: &str) -> ModelResult<PathBuf> {
        let base = self.resolve_base_dir()?;
        let short = model_short_name(model_id);

        let candidates = [
            base.join(EMBEDDINGS_SUBDIR).join(short),
            base.join(model_id),
            base.join(short),
        ];

        candidates
            .iter()
            .find(|p| p.join("config.json").is_file())
            .cloned()
            .ok_or_else(|| ModelError::ModelNotFound {
                model_id: model_id.to_string(),
                path: candidates[0].clone(),
            })
    }

    /// Whether the default embedding model is installed.
    pub fn has_default_embedding_model(&self) -> bool {
        self.embedding_model_path(DEFAULT_EMBEDDING_MODEL_NAME)
            .is_ok()
    }

    /// Check that a model directory has every file in [`REQUIRED_MODEL_FILES`].
    pub fn validate_model_dir(&self, path: &Path) -> ModelResult<()> {
        if !path.is_dir() {
            return Err(ModelError::ModelNotFound {
                model_id: path.display().to_string(),
                path: path.to_path_buf(),
            });
        }

        let missing: Vec<&'static str> = REQUIRED_MODEL_FILES
            .iter()
            .copied()
            .filter(|file| !path.join(file).exists())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ModelError::IncompleteModelFiles {
                path: path.to_path_buf(),
                missing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn install(temp: &TempDir, rel: &str) -> PathBuf {
        let dir = temp.path().join(rel);
        fs::create_dir_all(&dir).unwrap();
        for file in REQUIRED_MODEL_FILES {
            fs::write(dir.join(file), "{}").unwrap();
        }
        dir
    }

    #[test]
    fn test_model_short_name() {
        assert_eq!(
            model_short_name("sentence-transformers/all-MiniLM-L6-v2"),
            "all-MiniLM-L6-v2"
        );
        assert_eq!(model_short_name("plain"), "plain");
    }

    #[test]
    fn test_pinned_base_dir_is_only_candidate() {
        let locator = ModelLocator::with_base_dir("/opt/models");
        assert_eq!(locator.search_dirs(), vec![PathBuf::from("/opt/models")]);
    }

    #[test]
    fn test_layouts_are_resolved() {
        let temp = TempDir::new().unwrap();
        let locator = ModelLocator::with_base_dir(temp.path());

        let nested = install(&temp, "embeddings/all-MiniLM-L6-v2");
        assert_eq!(
            locator
                .embedding_model_path("sentence-transformers/all-MiniLM-L6-v2")
                .unwrap(),
            nested
        );

        let flat = install(&temp, "bge-small");
        assert_eq!(locator.embedding_model_path("BAAI/bge-small").unwrap(), flat);
    }

    #[test]
    fn test_validate_reports_missing_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("partial");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.json"), "{}").unwrap();

        let err = ModelLocator::new().validate_model_dir(&dir).unwrap_err();
        match err {
            ModelError::IncompleteModelFiles { missing, .. } => {
                assert_eq!(missing, vec!["model.safetensors", "tokenizer.json"]);
            }
            other => panic!("Expected IncompleteModelFiles, got {:?}", other),
        }
    }
}
