//! Fail-open inference over a lazily loaded classifier.
//!
//! A [`Predictor`] loads its artifacts on first use and caches them for its
//! whole lifetime. [`Predictor::predict`] always returns a
//! [`PredictionResult`]; missing artifacts and classifier failures are
//! reported through its `error` field with category
//! [`UNCATEGORIZED`](crate::UNCATEGORIZED) and a low confidence.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::artifacts::{ArtifactError, ArtifactStore};
use crate::classifier::Classifier;
use crate::label_map::{Label, UNCATEGORIZED};
use crate::normalize::normalize;

/// Confidence reported for every fallback result.
pub const FALLBACK_CONFIDENCE: f32 = 0.1;
/// Confidence reported when the classifier gives no probability estimate.
pub const DEFAULT_CONFIDENCE: f32 = 0.8;
/// Error message of results produced while the artifacts are unavailable.
pub const MODEL_NOT_LOADED: &str = "Model not loaded";

/// The answer to a single prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub category: String,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            category: UNCATEGORIZED.to_string(),
            confidence: FALLBACK_CONFIDENCE,
            label: None,
            error: Some(error.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Source of the classifier a [`Predictor`] serves.
pub trait ArtifactLoader: Send + Sync {
    fn load(&self) -> Result<Classifier, ArtifactError>;
}

impl ArtifactLoader for ArtifactStore {
    fn load(&self) -> Result<Classifier, ArtifactError> {
        ArtifactStore::load(self)
    }
}

/// An already-built classifier loads as itself.
impl ArtifactLoader for Classifier {
    fn load(&self) -> Result<Classifier, ArtifactError> {
        Ok(self.clone())
    }
}

enum LoadState {
    NotLoaded,
    /// Loading was attempted and failed; kept until an explicit reload.
    Unavailable(String),
    Loaded(Arc<Classifier>),
}

/// Serves category predictions with a load-once guard.
///
/// The first call to [`predict`](Self::predict) (or [`load`](Self::load))
/// reads the artifacts under a mutex, so concurrent first calls load them
/// exactly once. Inference itself runs outside the lock on a shared,
/// immutable [`Classifier`].
///
/// ```rust
/// use spendcat::Predictor;
///
/// let predictor = Predictor::from_dir("/nonexistent/spendcat/models");
/// let result = predictor.predict("STARBUCKS #123", Some("Starbucks"));
/// assert_eq!(result.category, "Uncategorized");
/// assert_eq!(result.confidence, 0.1);
/// assert_eq!(result.error.as_deref(), Some("Model not loaded"));
/// ```
pub struct Predictor {
    loader: Box<dyn ArtifactLoader>,
    state: Mutex<LoadState>,
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.lock_state() {
            LoadState::NotLoaded => "NotLoaded",
            LoadState::Unavailable(_) => "Unavailable",
            LoadState::Loaded(_) => "Loaded",
        };
        f.debug_struct("Predictor").field("state", &state).finish()
    }
}

impl Predictor {
    /// Creates a predictor that reads its artifacts from `store`
    pub fn new(store: ArtifactStore) -> Self {
        Self::with_loader(store)
    }

    /// Creates a predictor over the artifacts in `model_dir`
    pub fn from_dir<P: AsRef<Path>>(model_dir: P) -> Self {
        Self::new(ArtifactStore::new(model_dir))
    }

    /// Creates a predictor over the default model directory
    pub fn new_default() -> Self {
        Self::new(ArtifactStore::new_default())
    }

    pub fn with_loader<L: ArtifactLoader + 'static>(loader: L) -> Self {
        Self {
            loader: Box::new(loader),
            state: Mutex::new(LoadState::NotLoaded),
        }
    }

    /// Loads the artifacts unless a load was already attempted.
    /// Returns whether the predictor is ready.
    pub fn load(&self) -> bool {
        self.ensure_loaded().is_some()
    }

    /// Discards any cached classifier or load failure and loads again.
    pub fn reload(&self) -> bool {
        let mut state = self.lock_state();
        *state = self.try_load();
        matches!(*state, LoadState::Loaded(_))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock_state(), LoadState::Loaded(_))
    }

    /// Why the last load attempt failed, if it did.
    pub fn load_error(&self) -> Option<String> {
        match &*self.lock_state() {
            LoadState::Unavailable(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Predicts the spending category of a transaction. Never fails.
    ///
    /// The description and merchant name are normalized exactly as at
    /// training time before reaching the classifier.
    pub fn predict(&self, transaction_text: &str, merchant_name: Option<&str>) -> PredictionResult {
        let Some(classifier) = self.ensure_loaded() else {
            return PredictionResult::fallback(MODEL_NOT_LOADED);
        };

        let text = normalize(transaction_text, merchant_name);
        match classifier.categorize(&text) {
            Ok(categorization) => {
                log::debug!(
                    "Predicted {:?} -> label {} ({})",
                    text, categorization.label, categorization.category
                );
                PredictionResult {
                    category: categorization.category,
                    confidence: categorization.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                    label: Some(categorization.label),
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("Inference failed for {:?}: {}", text, e);
                PredictionResult::fallback(e.to_string())
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_loaded(&self) -> Option<Arc<Classifier>> {
        let mut state = self.lock_state();
        if matches!(*state, LoadState::NotLoaded) {
            *state = self.try_load();
        }
        match &*state {
            LoadState::Loaded(classifier) => Some(Arc::clone(classifier)),
            _ => None,
        }
    }

    fn try_load(&self) -> LoadState {
        match self.loader.load() {
            Ok(classifier) => {
                log::info!("Classifier loaded ({} categories)", classifier.label_map().len());
                LoadState::Loaded(Arc::new(classifier))
            }
            Err(e) => {
                log::error!("Error loading model: {}", e);
                LoadState::Unavailable(e.to_string())
            }
        }
    }
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierCapability, ClassifierError, LabelClassifier};
    use crate::label_map::LabelMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    impl LabelClassifier for Echo {
        fn predict_label(&self, text: &str) -> Result<Label, ClassifierError> {
            Ok(text.len() as Label)
        }
    }

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ArtifactLoader for CountingLoader {
        fn load(&self) -> Result<Classifier, ArtifactError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ArtifactError::IoError(std::io::Error::other("disk on fire")));
            }
            let map = LabelMap::from_pairs([(3, "Short")]);
            Ok(Classifier::new(ClassifierCapability::label_only(Echo), map))
        }
    }

    #[test]
    fn test_fallback_serialization_omits_label() {
        let json = serde_json::to_string(&PredictionResult::fallback(MODEL_NOT_LOADED)).unwrap();
        assert_eq!(
            json,
            r#"{"category":"Uncategorized","confidence":0.1,"error":"Model not loaded"}"#
        );
    }

    #[test]
    fn test_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let predictor = Predictor::with_loader(CountingLoader { calls: Arc::clone(&calls), fail: false });
        assert!(!predictor.is_loaded());

        let result = predictor.predict("Abc", None);
        assert_eq!(result.category, "Short");
        assert_eq!(result.label, Some(3));
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);

        predictor.predict("something longer", Some("merchant"));
        assert!(predictor.is_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_remembered_until_reload() {
        let calls = Arc::new(AtomicUsize::new(0));
        let predictor = Predictor::with_loader(CountingLoader { calls: Arc::clone(&calls), fail: true });

        for _ in 0..3 {
            let result = predictor.predict("abc", None);
            assert_eq!(result, PredictionResult::fallback(MODEL_NOT_LOADED));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(predictor.load_error().unwrap().contains("disk on fire"));

        assert!(!predictor.reload());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_debug_reports_state() {
        let predictor = Predictor::from_dir("/nonexistent/spendcat");
        assert!(format!("{:?}", predictor).contains("NotLoaded"));
        predictor.load();
        assert!(format!("{:?}", predictor).contains("Unavailable"));
    }
}
