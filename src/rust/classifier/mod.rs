mod builder;
mod capability;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
mod linear;
mod pipeline;
mod utils;
mod vectorizer;

pub use builder::{CategoryDefinition, ClassifierBuilder, TrainedModel};
pub use capability::{ClassifierCapability, ConfidenceClassifier, LabelClassifier};
pub use classifier::{Categorization, Classifier};
pub use error::ClassifierError;
pub use linear::LogisticRegression;
pub use pipeline::TextPipeline;
pub use utils::SparseVector;
pub use vectorizer::TfIdfVectorizer;

/// Summary of a classifier's categories and capabilities.
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    pub num_categories: usize,
    pub categories: Vec<String>,
    pub supports_confidence: bool,
}
