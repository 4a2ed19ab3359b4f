//! Precision, recall and F1 over a labeled test set.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::classifier::{Classifier, ClassifierError};
use crate::dataset::LabeledText;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMetrics {
    pub category: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of rows whose true category is this one.
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-category metrics plus overall accuracy, sorted by category name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub categories: Vec<CategoryMetrics>,
    pub accuracy: f64,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
    pub total: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Builds a report from `(true, predicted)` category pairs.
///
/// Categories that were only ever predicted appear with zero support.
pub fn report_from_pairs<T, P>(pairs: &[(T, P)]) -> ClassificationReport
where
    T: AsRef<str>,
    P: AsRef<str>,
{
    #[derive(Default)]
    struct Counts {
        true_positive: usize,
        predicted: usize,
        actual: usize,
    }

    let names: BTreeSet<&str> = pairs
        .iter()
        .flat_map(|(t, p)| [t.as_ref(), p.as_ref()])
        .collect();
    let mut counts: BTreeMap<&str, Counts> = names.into_iter().map(|n| (n, Counts::default())).collect();

    let mut correct = 0;
    for (truth, predicted) in pairs {
        let (truth, predicted) = (truth.as_ref(), predicted.as_ref());
        if let Some(c) = counts.get_mut(truth) {
            c.actual += 1;
        }
        if let Some(c) = counts.get_mut(predicted) {
            c.predicted += 1;
        }
        if truth == predicted {
            correct += 1;
            if let Some(c) = counts.get_mut(truth) {
                c.true_positive += 1;
            }
        }
    }

    let categories: Vec<CategoryMetrics> = counts
        .into_iter()
        .map(|(name, c)| {
            let precision = ratio(c.true_positive, c.predicted);
            let recall = ratio(c.true_positive, c.actual);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            CategoryMetrics {
                category: name.to_string(),
                precision,
                recall,
                f1,
                support: c.actual,
            }
        })
        .collect();

    let total = pairs.len();
    let n = categories.len().max(1) as f64;
    let macro_avg = Averages {
        precision: categories.iter().map(|m| m.precision).sum::<f64>() / n,
        recall: categories.iter().map(|m| m.recall).sum::<f64>() / n,
        f1: categories.iter().map(|m| m.f1).sum::<f64>() / n,
    };
    let weight = |f: fn(&CategoryMetrics) -> f64| {
        if total == 0 {
            0.0
        } else {
            categories.iter().map(|m| f(m) * m.support as f64).sum::<f64>() / total as f64
        }
    };
    let weighted_avg = Averages {
        precision: weight(|m| m.precision),
        recall: weight(|m| m.recall),
        f1: weight(|m| m.f1),
    };

    ClassificationReport {
        accuracy: ratio(correct, total),
        categories,
        macro_avg,
        weighted_avg,
        total,
    }
}

/// Categorizes every row and compares against its true category.
pub fn evaluate(classifier: &Classifier, rows: &[LabeledText]) -> Result<ClassificationReport, ClassifierError> {
    let mut pairs = Vec::with_capacity(rows.len());
    for row in rows {
        let predicted = classifier.categorize(&row.clean_text)?;
        pairs.push((row.category.as_str(), predicted.category));
    }
    Ok(report_from_pairs(&pairs))
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .categories
            .iter()
            .map(|m| m.category.chars().count())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or_default();

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.categories {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
                m.category, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9.2}  {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}
