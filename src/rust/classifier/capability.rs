use std::fmt;
use std::sync::Arc;

use super::error::ClassifierError;
use crate::label_map::Label;

/// A trained model that maps normalized text to a label.
///
/// Implementations must be safe to call from several threads at once.
pub trait LabelClassifier: Send + Sync {
    fn predict_label(&self, text: &str) -> Result<Label, ClassifierError>;
}

/// A [`LabelClassifier`] that can also report a probability per class.
pub trait ConfidenceClassifier: LabelClassifier {
    /// Probabilities over the model's classes; the largest one is used as the
    /// prediction confidence.
    fn predict_probabilities(&self, text: &str) -> Result<Vec<f32>, ClassifierError>;
}

/// The classifier behind a [`Classifier`](super::Classifier), with its
/// confidence support fixed when it is constructed.
#[derive(Clone)]
pub enum ClassifierCapability {
    WithConfidence(Arc<dyn ConfidenceClassifier>),
    LabelOnly(Arc<dyn LabelClassifier>),
}

impl ClassifierCapability {
    pub fn with_confidence<C: ConfidenceClassifier + 'static>(classifier: C) -> Self {
        Self::WithConfidence(Arc::new(classifier))
    }

    pub fn label_only<C: LabelClassifier + 'static>(classifier: C) -> Self {
        Self::LabelOnly(Arc::new(classifier))
    }

    pub fn supports_confidence(&self) -> bool {
        matches!(self, Self::WithConfidence(_))
    }

    pub fn predict_label(&self, text: &str) -> Result<Label, ClassifierError> {
        match self {
            Self::WithConfidence(classifier) => classifier.predict_label(text),
            Self::LabelOnly(classifier) => classifier.predict_label(text),
        }
    }

    /// Highest class probability for `text`, clamped to `[0, 1]`.
    ///
    /// Returns `None` for label-only classifiers, and when the probability
    /// call fails or yields no finite value.
    pub fn confidence(&self, text: &str) -> Option<f32> {
        let Self::WithConfidence(classifier) = self else {
            return None;
        };

        match classifier.predict_probabilities(text) {
            Ok(probabilities) => probabilities
                .into_iter()
                .filter(|p| p.is_finite())
                .reduce(f32::max)
                .map(|p| p.clamp(0.0, 1.0)),
            Err(e) => {
                log::debug!("Probability estimate unavailable: {}", e);
                None
            }
        }
    }
}

impl fmt::Debug for ClassifierCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithConfidence(_) => f.write_str("ClassifierCapability::WithConfidence"),
            Self::LabelOnly(_) => f.write_str("ClassifierCapability::LabelOnly"),
        }
    }
}
