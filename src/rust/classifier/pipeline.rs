use serde::{Deserialize, Serialize};

use super::capability::{ConfidenceClassifier, LabelClassifier};
use super::error::ClassifierError;
use super::linear::LogisticRegression;
use super::vectorizer::TfIdfVectorizer;
use crate::config::TrainingConfig;
use crate::label_map::Label;

/// Tf-idf vectorizer followed by a logistic regression: the serialized
/// classifier artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPipeline {
    vectorizer: TfIdfVectorizer,
    model: LogisticRegression,
}

impl TextPipeline {
    /// Fits both stages on already-normalized documents.
    pub fn fit<S: AsRef<str>>(
        documents: &[S],
        labels: &[Label],
        config: &TrainingConfig,
    ) -> Result<Self, ClassifierError> {
        if documents.len() != labels.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }

        let vectorizer = TfIdfVectorizer::fit(documents)?;
        let features = documents
            .iter()
            .map(|document| vectorizer.transform(document.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let model = LogisticRegression::fit(&features, labels, vectorizer.vocabulary_size(), config)?;

        log::info!(
            "Fitted pipeline on {} documents: {} terms, {} classes",
            documents.len(),
            vectorizer.vocabulary_size(),
            model.classes().len()
        );

        Ok(Self { vectorizer, model })
    }

    /// Labels the model can emit, in probability order.
    pub fn classes(&self) -> &[Label] {
        self.model.classes()
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &LogisticRegression {
        &self.model
    }

    /// Checks that a deserialized pipeline is internally consistent.
    pub fn validate(&self) -> Result<(), String> {
        self.vectorizer.validate()?;
        self.model.validate()?;
        if self.model.n_features() != self.vectorizer.vocabulary_size() {
            return Err(format!(
                "model expects {} features but vectorizer produces {}",
                self.model.n_features(),
                self.vectorizer.vocabulary_size()
            ));
        }
        Ok(())
    }
}

impl LabelClassifier for TextPipeline {
    fn predict_label(&self, text: &str) -> Result<Label, ClassifierError> {
        let features = self.vectorizer.transform(text)?;
        self.model.predict(&features)
    }
}

impl ConfidenceClassifier for TextPipeline {
    fn predict_probabilities(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let features = self.vectorizer.transform(text)?;
        self.model.predict_proba(&features)
    }
}
