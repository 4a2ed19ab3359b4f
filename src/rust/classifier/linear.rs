use std::collections::{BTreeSet, HashMap};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{argmax, softmax_inplace, SparseVector};
use crate::config::TrainingConfig;
use crate::label_map::Label;

/// Multinomial logistic regression over sparse features.
///
/// Minimizes the mean cross-entropy plus `1 / (2 * C * n) * ||W||²` with
/// full-batch gradient descent. Intercepts are not penalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    classes: Vec<Label>,
    /// Shape `(n_classes, n_features)`.
    weights: Array2<f32>,
    intercept: Array1<f32>,
}

impl LogisticRegression {
    /// Fits the model. `targets[i]` is the label of `samples[i]`; every
    /// feature index must be below `n_features`.
    ///
    /// # Errors
    /// - `ValidationError` for mismatched lengths, out-of-range feature
    ///   indices or an invalid config
    /// - `TrainingError` for fewer than two distinct labels or a diverging loss
    pub fn fit(
        samples: &[SparseVector],
        targets: &[Label],
        n_features: usize,
        config: &TrainingConfig,
    ) -> Result<Self, ClassifierError> {
        config.validate()?;

        if samples.len() != targets.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} samples but {} targets",
                samples.len(),
                targets.len()
            )));
        }
        if samples.is_empty() {
            return Err(ClassifierError::TrainingError("Cannot fit on zero samples".into()));
        }
        if let Some(index) = samples.iter().flatten().map(|&(j, _)| j).find(|&j| j >= n_features) {
            return Err(ClassifierError::ValidationError(format!(
                "Feature index {} out of range for {} features",
                index, n_features
            )));
        }

        let classes: Vec<Label> = targets.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if classes.len() < 2 {
            return Err(ClassifierError::TrainingError(format!(
                "Training data needs samples of at least 2 classes, got {}",
                classes.len()
            )));
        }

        let class_index: HashMap<Label, usize> =
            classes.iter().enumerate().map(|(i, &label)| (label, i)).collect();
        let y: Vec<usize> = targets.iter().map(|label| class_index[label]).collect();

        let n_classes = classes.len();
        let n = samples.len() as f32;
        let l2 = 1.0 / (config.c * n);

        let mut weights = Array2::<f32>::zeros((n_classes, n_features));
        let mut intercept = Array1::<f32>::zeros(n_classes);
        let mut previous_loss = f32::INFINITY;
        let mut iterations = 0;

        for iteration in 0..config.max_iter {
            iterations = iteration + 1;
            let mut grad_w = Array2::<f32>::zeros((n_classes, n_features));
            let mut grad_b = Array1::<f32>::zeros(n_classes);
            let mut loss = 0.0f32;

            for (x, &target) in samples.iter().zip(&y) {
                let mut probs = linear_scores(&weights, &intercept, x);
                softmax_inplace(&mut probs);
                loss -= probs[target].max(f32::MIN_POSITIVE).ln();

                for (c, p) in probs.iter().enumerate() {
                    let g = if c == target { p - 1.0 } else { *p };
                    grad_b[c] += g;
                    for &(j, v) in x {
                        grad_w[[c, j]] += g * v;
                    }
                }
            }

            loss = loss / n + 0.5 * l2 * weights.iter().map(|w| w * w).sum::<f32>();
            if !loss.is_finite() {
                return Err(ClassifierError::TrainingError(format!(
                    "Loss diverged at iteration {}; try a smaller learning rate",
                    iterations
                )));
            }

            grad_w /= n;
            grad_b /= n;
            grad_w.scaled_add(l2, &weights);

            weights.scaled_add(-config.learning_rate, &grad_w);
            intercept.scaled_add(-config.learning_rate, &grad_b);

            if (previous_loss - loss).abs() < config.tolerance {
                break;
            }
            previous_loss = loss;
        }

        log::debug!(
            "Logistic regression fitted in {} iteration(s), final loss {:.6}",
            iterations, previous_loss
        );

        Ok(Self {
            classes,
            weights,
            intercept,
        })
    }

    /// Raw per-class scores, in [`classes`](Self::classes) order.
    pub fn decision_function(&self, x: &SparseVector) -> Result<Vec<f32>, ClassifierError> {
        if let Some(&(j, _)) = x.iter().find(|&&(j, _)| j >= self.n_features()) {
            return Err(ClassifierError::PredictionError(format!(
                "Feature index {} out of range for {} features",
                j,
                self.n_features()
            )));
        }
        Ok(linear_scores(&self.weights, &self.intercept, x))
    }

    /// Class probabilities, in [`classes`](Self::classes) order.
    pub fn predict_proba(&self, x: &SparseVector) -> Result<Vec<f32>, ClassifierError> {
        let mut scores = self.decision_function(x)?;
        softmax_inplace(&mut scores);
        Ok(scores)
    }

    pub fn predict(&self, x: &SparseVector) -> Result<Label, ClassifierError> {
        let scores = self.decision_function(x)?;
        argmax(&scores)
            .and_then(|idx| self.classes.get(idx).copied())
            .ok_or_else(|| ClassifierError::PredictionError("Model has no classes".into()))
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    /// Checks internal consistency of a deserialized model.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err(format!("model has {} class(es), expected at least 2", self.classes.len()));
        }
        if self.weights.nrows() != self.classes.len() || self.intercept.len() != self.classes.len() {
            return Err(format!(
                "model has {} classes but {} weight rows and {} intercepts",
                self.classes.len(),
                self.weights.nrows(),
                self.intercept.len()
            ));
        }
        if self.weights.iter().chain(self.intercept.iter()).any(|w| !w.is_finite()) {
            return Err("model has non-finite coefficients".into());
        }
        Ok(())
    }
}

fn linear_scores(weights: &Array2<f32>, intercept: &Array1<f32>, x: &SparseVector) -> Vec<f32> {
    let mut scores = intercept.to_vec();
    for &(j, v) in x {
        for (score, w) in scores.iter_mut().zip(weights.column(j)) {
            *score += w * v;
        }
    }
    scores
}
