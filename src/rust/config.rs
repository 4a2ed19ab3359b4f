use crate::classifier::ClassifierError;
use crate::dataset::DatasetError;

/// Hyperparameters for fitting the logistic regression stage of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Upper bound on full-batch gradient steps.
    pub max_iter: usize,
    /// Gradient descent step size.
    pub learning_rate: f32,
    /// Inverse L2 regularization strength; smaller values regularize more.
    pub c: f32,
    /// Training stops once the loss improves by less than this between steps.
    pub tolerance: f32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 1.0,
            c: 1.0,
            tolerance: 1e-5,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.max_iter == 0 {
            return Err(ClassifierError::ValidationError("max_iter must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ClassifierError::ValidationError(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ClassifierError::ValidationError(format!(
                "C must be a positive number, got {}",
                self.c
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(ClassifierError::ValidationError(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Controls how preprocessed rows are divided between training and evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation, in `[0, 1)`.
    pub test_size: f64,
    /// Seed for the shuffle, so repeated runs produce the same split.
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), DatasetError> {
        if !(self.test_size.is_finite() && (0.0..1.0).contains(&self.test_size)) {
            return Err(DatasetError::InvalidConfig(format!(
                "test_size must be in [0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}
