//! End-to-end training: prepared data in, saved artifacts out.

use std::path::Path;

use log::info;
use thiserror::Error;

use crate::artifacts::{ArtifactError, ArtifactStore};
use crate::classifier::{ClassifierBuilder, ClassifierError, TrainedModel};
use crate::config::TrainingConfig;
use crate::dataset::{self, DatasetError, LabeledText, PreparedData};
use crate::evaluation::{self, ClassificationReport};
use crate::label_map::LabelMap;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    /// Evaluation on the held-out rows; `None` when there were none.
    pub report: Option<ClassificationReport>,
}

fn fit(rows: &[LabeledText], config: &TrainingConfig, label_map: Option<&LabelMap>) -> Result<TrainedModel, TrainError> {
    config.validate()?;
    let mut builder = ClassifierBuilder::new().with_config(config.clone());
    if let Some(map) = label_map {
        builder = builder.with_label_map(map.clone());
    }
    let builder = builder.add_examples(rows.iter().map(|row| (row.clean_text.as_str(), row.category.as_str())))?;
    Ok(builder.build()?)
}

/// Fits on the training rows, reusing the preprocessing label map when one is
/// present, and evaluates on the test rows.
pub fn train(data: &PreparedData, config: &TrainingConfig) -> Result<TrainingOutcome, TrainError> {
    if data.train.is_empty() {
        return Err(DatasetError::Empty("Training data is empty".into()).into());
    }

    let model = fit(&data.train, config, data.label_map.as_ref())?;

    let report = if data.test.is_empty() {
        None
    } else {
        let report = evaluation::evaluate(&model.classifier(), &data.test)?;
        info!("Test accuracy: {:.4} over {} rows", report.accuracy, report.total);
        Some(report)
    };

    Ok(TrainingOutcome { model, report })
}

/// Trains from a preprocessing output directory and saves the artifacts.
pub fn train_from_dir<P: AsRef<Path>>(
    data_dir: P,
    store: &ArtifactStore,
    config: &TrainingConfig,
) -> Result<TrainingOutcome, TrainError> {
    let data = dataset::load_prepared(data_dir)?;
    let outcome = train(&data, config)?;
    store.save(&outcome.model)?;
    info!("Model saved to {}", store.model_dir().display());
    Ok(outcome)
}

/// Fits a fresh model on every row of a corrected-transactions CSV
/// (`name,amount,category`, optionally `merchant_name`) and saves it,
/// replacing the current artifacts.
pub fn retrain<P: AsRef<Path>>(
    input: P,
    store: &ArtifactStore,
    config: &TrainingConfig,
) -> Result<TrainedModel, TrainError> {
    let rows = dataset::load_transactions(input)?;
    if rows.is_empty() {
        return Err(DatasetError::Empty("Training data is empty".into()).into());
    }

    info!("Retraining on {} transactions", rows.len());
    let model = fit(&rows, config, None)?;
    store.save(&model)?;
    info!("Model retrained and saved to {}", store.model_dir().display());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(text: &str, category: &str) -> LabeledText {
        LabeledText {
            clean_text: text.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_empty_training_data() {
        let data = PreparedData {
            train: Vec::new(),
            test: Vec::new(),
            label_map: None,
        };
        let result = train(&data, &TrainingConfig::default());
        assert!(matches!(result, Err(TrainError::Dataset(DatasetError::Empty(_)))));
    }

    #[test]
    fn test_train_reuses_label_map_and_reports() {
        let label_map = LabelMap::from_pairs([(10, "Dining"), (20, "Gas")]);
        let data = PreparedData {
            train: vec![
                row("starbucks coffee", "Dining"),
                row("mcdonalds burgers", "Dining"),
                row("shell gas station", "Gas"),
                row("chevron fuel", "Gas"),
            ],
            test: vec![row("starbucks coffee", "Dining"), row("shell gas station", "Gas")],
            label_map: Some(label_map.clone()),
        };

        let outcome = train(&data, &TrainingConfig::default()).unwrap();
        assert_eq!(outcome.model.label_map, label_map);
        let report = outcome.report.unwrap();
        assert_eq!(report.total, 2);
        assert!(report.accuracy > 0.99);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let data = PreparedData {
            train: vec![row("a1 b2", "A"), row("c3 d4", "B")],
            test: Vec::new(),
            label_map: None,
        };
        let config = TrainingConfig { c: -1.0, ..Default::default() };
        assert!(matches!(train(&data, &config), Err(TrainError::Classifier(_))));
    }
}
