//! A bank-transaction category classifier with fail-open inference.
//!
//! Transaction descriptions and merchant names are cleaned, vectorized with
//! TF-IDF and classified by a multinomial logistic regression. Numeric labels
//! are turned into category names through a [`LabelMap`] that is persisted
//! next to the model.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use spendcat::{ArtifactStore, CategoryDefinition, Classifier, Predictor};
//!
//! let model = Classifier::builder()
//!     .add_category(
//!         CategoryDefinition::new("Dining")
//!             .with_examples(vec!["starbucks coffee", "mcdonalds", "chipotle grill"])
//!     )?
//!     .add_category(
//!         CategoryDefinition::new("Gas")
//!             .with_examples(vec!["shell gas station", "chevron fuel", "exxon mobil"])
//!     )?
//!     .build()?;
//!
//! let dir = std::env::temp_dir().join("spendcat-doc-basic");
//! let store = ArtifactStore::new(&dir);
//! store.save(&model)?;
//!
//! let predictor = Predictor::new(store);
//! let result = predictor.predict("SHELL OIL 123", Some("Shell"));
//! println!("{} ({:.2})", result.category, result.confidence);
//! assert!(result.error.is_none());
//! # std::fs::remove_dir_all(&dir)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A [`Predictor`] loads its artifacts at most once and can be shared across
//! threads using `Arc`:
//!
//! ```rust
//! use spendcat::Predictor;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let predictor = Arc::new(Predictor::from_dir("/nonexistent/spendcat/models"));
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let predictor = Arc::clone(&predictor);
//!     handles.push(thread::spawn(move || {
//!         predictor.predict("test transaction", None)
//!     }));
//! }
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap().category, "Uncategorized");
//! }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod label_map;
mod normalize;
pub mod predictor;
pub mod training;

pub use artifacts::{ArtifactError, ArtifactStore};
pub use classifier::{
    CategoryDefinition, Classifier, ClassifierBuilder, ClassifierCapability, ClassifierError, ClassifierInfo,
    TrainedModel,
};
pub use config::{SplitConfig, TrainingConfig};
pub use label_map::{Label, LabelMap, LabelMapError, UNCATEGORIZED};
pub use normalize::{clean_text, normalize};
pub use predictor::{PredictionResult, Predictor};

pub fn init_logger() {
    env_logger::init();
}
