use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::classifier::{Classifier, TextPipeline, TrainedModel};
use crate::label_map::{LabelMap, LabelMapError};

/// Serialized [`TextPipeline`], JSON.
pub const CLASSIFIER_FILE: &str = "transaction_classifier.json";
/// Hex sha256 digest of [`CLASSIFIER_FILE`].
pub const CHECKSUM_FILE: &str = "transaction_classifier.sha256";
/// Label map, CSV with a `label,category` header.
pub const LABEL_MAP_FILE: &str = "category_label_map.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Classifier,
    LabelMap,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classifier => f.write_str("Classifier artifact"),
            Self::LabelMap => f.write_str("Label map"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("{kind} not found: {}", .path.display())]
    Missing { kind: ArtifactKind, path: PathBuf },
    #[error("Corrupt label map {}: {source}", .path.display())]
    CorruptLabelMap {
        path: PathBuf,
        #[source]
        source: LabelMapError,
    },
    #[error("Corrupt classifier artifact {}: {reason}", .path.display())]
    CorruptClassifier { path: PathBuf, reason: String },
    #[error("Hash mismatch: expected {expected}, got {actual} for {}", .path.display())]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Locates, writes and reads the classifier artifact and label map inside a
/// model directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    model_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store over the default model directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_model_dir())
    }

    /// Returns the default model directory path
    pub fn get_default_model_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("SPENDCAT_HOME") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_local_dir() {
            return data_dir.join("spendcat").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("spendcat").join("models");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("spendcat").join("models")
    }

    /// Creates a store over `model_dir`. Nothing is created on disk until
    /// [`save`](Self::save).
    pub fn new<P: AsRef<Path>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.model_dir.join(CLASSIFIER_FILE)
    }

    pub fn checksum_path(&self) -> PathBuf {
        self.model_dir.join(CHECKSUM_FILE)
    }

    pub fn label_map_path(&self) -> PathBuf {
        self.model_dir.join(LABEL_MAP_FILE)
    }

    /// True when both the classifier artifact and the label map exist.
    pub fn is_ready(&self) -> bool {
        let classifier_path = self.classifier_path();
        let label_map_path = self.label_map_path();
        log::debug!("Checking artifacts in {:?}:", self.model_dir);
        log::debug!("  Classifier path: {:?} (exists: {})", classifier_path, classifier_path.exists());
        log::debug!("  Label map path: {:?} (exists: {})", label_map_path, label_map_path.exists());
        classifier_path.exists() && label_map_path.exists()
    }

    /// Writes the pipeline, its checksum and the label map, creating the
    /// model directory if needed.
    pub fn save(&self, model: &TrainedModel) -> Result<(), ArtifactError> {
        log::info!("Saving artifacts to {:?}", self.model_dir);
        fs::create_dir_all(&self.model_dir)?;

        let bytes = serde_json::to_vec(&model.pipeline)?;
        let hash = sha256_hex(&bytes);
        fs::write(self.classifier_path(), &bytes)?;
        fs::write(self.checksum_path(), format!("{}\n", hash))?;
        log::info!("Wrote {} bytes of classifier artifact (sha256 {})", bytes.len(), hash);

        let label_map_path = self.label_map_path();
        model.label_map.save(&label_map_path).map_err(|source| match source {
            LabelMapError::IoError(e) => ArtifactError::IoError(e),
            source => ArtifactError::CorruptLabelMap {
                path: label_map_path.clone(),
                source,
            },
        })?;
        log::info!("Wrote label map with {} categories", model.label_map.len());
        Ok(())
    }

    /// Reads and validates the classifier artifact.
    ///
    /// When a checksum file is present the artifact bytes must match it.
    pub fn load_pipeline(&self) -> Result<TextPipeline, ArtifactError> {
        let path = self.classifier_path();
        if !path.exists() {
            return Err(ArtifactError::Missing {
                kind: ArtifactKind::Classifier,
                path,
            });
        }

        let bytes = fs::read(&path)?;
        match self.read_checksum()? {
            Some(expected) => {
                let actual = sha256_hex(&bytes);
                if actual != expected {
                    log::error!("Classifier hash mismatch: expected {}, got {}", expected, actual);
                    return Err(ArtifactError::HashMismatch { path, expected, actual });
                }
            }
            None => log::warn!("No checksum found for {:?}, skipping verification", path),
        }

        let pipeline: TextPipeline = serde_json::from_slice(&bytes).map_err(|e| {
            ArtifactError::CorruptClassifier {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        pipeline
            .validate()
            .map_err(|reason| ArtifactError::CorruptClassifier { path, reason })?;
        Ok(pipeline)
    }

    /// Reads the label map.
    pub fn load_label_map(&self) -> Result<LabelMap, ArtifactError> {
        let path = self.label_map_path();
        if !path.exists() {
            return Err(ArtifactError::Missing {
                kind: ArtifactKind::LabelMap,
                path,
            });
        }

        LabelMap::load(&path).map_err(|source| ArtifactError::CorruptLabelMap { path, source })
    }

    /// Loads the classifier artifact, then the label map, into a
    /// [`Classifier`].
    pub fn load(&self) -> Result<Classifier, ArtifactError> {
        let pipeline = self.load_pipeline()?;
        let label_map = self.load_label_map()?;

        let unmapped: Vec<_> = pipeline
            .classes()
            .iter()
            .filter(|&&label| !label_map.contains_label(label))
            .collect();
        if !unmapped.is_empty() {
            log::warn!("Classifier labels {:?} have no label map entry", unmapped);
        }

        log::info!(
            "Loaded classifier from {:?}: {} classes, {} label map entries",
            self.model_dir,
            pipeline.classes().len(),
            label_map.len()
        );
        Ok(Classifier::from_pipeline(pipeline, label_map))
    }

    /// True when every artifact exists and the classifier matches its checksum.
    pub fn verify(&self) -> Result<bool, ArtifactError> {
        if !self.is_ready() || !self.checksum_path().exists() {
            log::info!("One or more artifact files do not exist");
            return Ok(false);
        }

        let bytes = fs::read(self.classifier_path())?;
        let actual = sha256_hex(&bytes);
        let expected = self.read_checksum()?;
        log::info!("Calculated hash: {}", actual);
        log::info!("Expected hash:   {:?}", expected);
        Ok(expected.as_deref() == Some(actual.as_str()))
    }

    /// Deletes every artifact file that exists.
    pub fn remove(&self) -> Result<(), ArtifactError> {
        for path in [self.classifier_path(), self.checksum_path(), self.label_map_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn read_checksum(&self) -> Result<Option<String>, ArtifactError> {
        let path = self.checksum_path();
        if !path.exists() {
            return Ok(None);
        }
        let hash = fs::read_to_string(&path)?.trim().to_lowercase();
        Ok(if hash.is_empty() { None } else { Some(hash) })
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierBuilder;

    fn trained() -> TrainedModel {
        ClassifierBuilder::new()
            .add_examples([
                ("kroger groceries", "Groceries"),
                ("safeway market", "Groceries"),
                ("shell gas", "Fuel"),
                ("chevron station", "Fuel"),
            ])
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_paths() {
        let store = ArtifactStore::new("/tmp/spendcat-paths");
        assert!(store.classifier_path().ends_with(CLASSIFIER_FILE));
        assert!(store.label_map_path().ends_with(LABEL_MAP_FILE));
        assert!(store.checksum_path().ends_with(CHECKSUM_FILE));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("models"));
        assert!(!store.is_ready());

        store.save(&trained()).unwrap();
        assert!(store.is_ready());
        assert!(store.verify().unwrap());

        let classifier = store.load().unwrap();
        assert_eq!(classifier.categorize("kroger").unwrap().category, "Groceries");
        assert!(classifier.info().supports_confidence);
    }

    #[test]
    fn test_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load(),
            Err(ArtifactError::Missing { kind: ArtifactKind::Classifier, .. })
        ));

        store.save(&trained()).unwrap();
        fs::remove_file(store.label_map_path()).unwrap();
        assert!(matches!(
            store.load(),
            Err(ArtifactError::Missing { kind: ArtifactKind::LabelMap, .. })
        ));
        assert!(!store.verify().unwrap());
    }

    #[test]
    fn test_tampered_artifact_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();

        let mut bytes = fs::read(store.classifier_path()).unwrap();
        bytes.push(b' ');
        fs::write(store.classifier_path(), bytes).unwrap();

        assert!(!store.verify().unwrap());
        assert!(matches!(store.load(), Err(ArtifactError::HashMismatch { .. })));
    }

    #[test]
    fn test_garbage_artifact_without_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();
        fs::remove_file(store.checksum_path()).unwrap();
        fs::write(store.classifier_path(), b"corrupted data").unwrap();

        assert!(matches!(store.load(), Err(ArtifactError::CorruptClassifier { .. })));
    }

    #[test]
    fn test_corrupt_label_map() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();
        fs::write(store.label_map_path(), "id,name\n0,Groceries\n").unwrap();

        assert!(matches!(store.load(), Err(ArtifactError::CorruptLabelMap { .. })));
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();
        store.remove().unwrap();
        assert!(!store.is_ready());
        assert!(!store.checksum_path().exists());
    }
}
