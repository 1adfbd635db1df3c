//! Model loader service
//!
//! Owns the artifact location and loads it lazily, at most once. Components
//! that need the classifier receive an `Arc<ModelLoader>` at construction.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use super::artifact::ModelArtifact;
use crate::config::ModelConfig;

/// Result of the one-time load.
#[derive(Debug, Clone)]
pub enum ArtifactState {
    Loaded(Arc<ModelArtifact>),
    /// Why no classifier is available
    Unavailable(String),
}

/// Lazily loaded, process-lifetime classifier artifact.
///
/// The first caller of [`ModelLoader::state`] performs the load; concurrent
/// callers block until it finishes and then see the same state. There is no
/// reload.
#[derive(Debug)]
pub struct ModelLoader {
    path: Option<PathBuf>,
    state: OnceLock<ArtifactState>,
}

impl ModelLoader {
    /// Load from `path` on first use.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            state: OnceLock::new(),
        }
    }

    /// Load from the configured path, or never if none is configured.
    pub fn from_config(config: &ModelConfig) -> Self {
        match &config.artifact_path {
            Some(path) => Self::from_path(path),
            None => Self::disabled(),
        }
    }

    /// Never provides a classifier.
    pub fn disabled() -> Self {
        Self {
            path: None,
            state: OnceLock::new(),
        }
    }

    /// Already loaded; used to inject an artifact directly.
    pub fn preloaded(artifact: ModelArtifact) -> Self {
        Self {
            path: None,
            state: OnceLock::from(ArtifactState::Loaded(Arc::new(artifact))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &ArtifactState {
        self.state.get_or_init(|| self.load())
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        match self.state() {
            ArtifactState::Loaded(artifact) => Some(artifact.as_ref()),
            ArtifactState::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.artifact().is_some()
    }

    fn load(&self) -> ArtifactState {
        let Some(path) = &self.path else {
            info!("No model artifact configured, ML stage disabled");
            return ArtifactState::Unavailable("no model artifact configured".to_string());
        };

        match ModelArtifact::load(path) {
            Ok(artifact) => {
                info!(
                    path = %path.display(),
                    features = artifact.feature_names().len(),
                    threshold = artifact.threshold(),
                    "Model artifact loaded"
                );
                ArtifactState::Loaded(Arc::new(artifact))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Model artifact unavailable, using rules only");
                ArtifactState::Unavailable(e.to_string())
            }
        }
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LOGISTIC: &str = r#"{
        "feature_names": ["m_age"],
        "model": {"kind": "logistic", "coefficients": [0.1], "intercept": -3.0}
    }"#;

    #[test]
    fn test_disabled_loader_is_unavailable() {
        let loader = ModelLoader::disabled();
        assert!(!loader.is_available());
        assert!(matches!(loader.state(), ArtifactState::Unavailable(_)));
    }

    #[test]
    fn test_missing_file_degrades() {
        let loader = ModelLoader::from_path("/nonexistent/pcb_model.json");
        assert!(loader.artifact().is_none());
        match loader.state() {
            ArtifactState::Unavailable(reason) => assert!(reason.contains("cannot read")),
            ArtifactState::Loaded(_) => panic!("must not load"),
        }
    }

    #[test]
    fn test_loads_once_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(LOGISTIC.as_bytes()).expect("write");
        let loader = ModelLoader::from_path(file.path());
        let first = loader.artifact().expect("loaded") as *const ModelArtifact;

        // Deleting the file does not matter once loaded
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
        let second = loader.artifact().expect("still loaded") as *const ModelArtifact;
        assert_eq!(first, second);
    }

    #[test]
    fn test_preloaded() {
        let artifact = ModelArtifact::from_json_str(LOGISTIC).unwrap();
        let loader = ModelLoader::preloaded(artifact);
        assert!(loader.is_available());
        assert!(loader.path().is_none());
    }

    #[test]
    fn test_concurrent_first_use_sees_one_state() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(LOGISTIC.as_bytes()).expect("write");
        let loader = Arc::new(ModelLoader::from_path(file.path()));
        let addrs: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let loader = Arc::clone(&loader);
                    s.spawn(move || loader.artifact().map(|a| a as *const _ as usize))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
        });
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }
}
