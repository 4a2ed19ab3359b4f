use std::sync::Arc;

use super::capability::ClassifierCapability;
use super::error::ClassifierError;
use super::pipeline::TextPipeline;
use crate::label_map::{Label, LabelMap, UNCATEGORIZED};

/// A classifier capability paired with the label map that names its output.
///
/// # Thread Safety
///
/// Both parts are held behind `Arc` and never mutated, so a `Classifier` is
/// `Send + Sync` and cheap to clone:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use spendcat::{Classifier, CategoryDefinition};
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(Classifier::builder()
///     .add_category(CategoryDefinition::new("Groceries").with_examples(vec!["kroger groceries"]))?
///     .add_category(CategoryDefinition::new("Transport").with_examples(vec!["uber trip"]))?
///     .build()?
///     .into_classifier());
///
/// let worker = Arc::clone(&classifier);
/// thread::spawn(move || {
///     worker.categorize("uber").unwrap();
/// }).join().unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    capability: ClassifierCapability,
    label_map: Arc<LabelMap>,
}

/// Outcome of a strict categorization.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorization {
    pub label: Label,
    pub category: String,
    /// `None` when the capability has no probability output or it failed.
    pub confidence: Option<f32>,
    /// `false` when the label had no label map entry.
    pub mapped: bool,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for training
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    pub fn new(capability: ClassifierCapability, label_map: LabelMap) -> Self {
        Self {
            capability,
            label_map: Arc::new(label_map),
        }
    }

    pub fn from_pipeline(pipeline: TextPipeline, label_map: LabelMap) -> Self {
        Self::new(ClassifierCapability::with_confidence(pipeline), label_map)
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_categories: self.label_map.len(),
            categories: self.label_map.categories().into_iter().map(str::to_owned).collect(),
            supports_confidence: self.capability.supports_confidence(),
        }
    }

    pub fn label_map(&self) -> &LabelMap {
        &self.label_map
    }

    pub fn capability(&self) -> &ClassifierCapability {
        &self.capability
    }

    /// Categorizes already-normalized text, propagating classifier failures.
    ///
    /// Labels without a label map entry resolve to
    /// [`UNCATEGORIZED`](crate::UNCATEGORIZED) and are logged as a warning.
    pub fn categorize(&self, text: &str) -> Result<Categorization, ClassifierError> {
        let label = self.capability.predict_label(text)?;

        let (category, mapped) = match self.label_map.get(label) {
            Some(category) => (category.to_string(), true),
            None => {
                log::warn!("Label {} has no entry in the label map", label);
                (UNCATEGORIZED.to_string(), false)
            }
        };

        Ok(Categorization {
            label,
            category,
            confidence: self.capability.confidence(text),
            mapped,
        })
    }
}
