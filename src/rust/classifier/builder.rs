use std::collections::BTreeSet;

use log::info;

use super::classifier::Classifier;
use super::error::ClassifierError;
use super::pipeline::TextPipeline;
use crate::config::TrainingConfig;
use crate::label_map::{Label, LabelMap};
use crate::normalize::clean_text;

/// A spending category together with example transaction texts.
#[derive(Debug, Clone)]
pub struct CategoryDefinition {
    /// The category name reported by predictions, e.g. "Groceries"
    pub name: String,
    /// Transaction texts known to belong to this category
    pub examples: Vec<String>,
}

impl CategoryDefinition {
    /// Creates a category with no examples yet
    ///
    /// # Example
    /// ```
    /// use spendcat::CategoryDefinition;
    ///
    /// let category = CategoryDefinition::new("Groceries");
    /// assert!(category.examples.is_empty());
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            examples: Vec::new(),
        }
    }

    /// Adds examples to the category definition
    ///
    /// # Example
    /// ```
    /// use spendcat::CategoryDefinition;
    ///
    /// let category = CategoryDefinition::new("Transport")
    ///     .with_examples(vec!["UBER TRIP", "LYFT RIDE"]);
    /// assert_eq!(category.examples.len(), 2);
    /// ```
    pub fn with_examples(mut self, examples: Vec<impl Into<String>>) -> Self {
        self.examples.extend(examples.into_iter().map(Into::into));
        self
    }
}

/// The artifact bundle produced by training: the fitted pipeline and the label
/// map that names its labels.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub pipeline: TextPipeline,
    pub label_map: LabelMap,
}

impl TrainedModel {
    pub fn into_classifier(self) -> Classifier {
        Classifier::from_pipeline(self.pipeline, self.label_map)
    }

    pub fn classifier(&self) -> Classifier {
        self.clone().into_classifier()
    }
}

/// A builder for training a classifier with a fluent interface.
///
/// Every example is passed through [`clean_text`], the same cleaning the
/// predictor applies to its input.
#[derive(Debug, Default)]
pub struct ClassifierBuilder {
    /// `(clean text, category)` pairs in insertion order
    examples: Vec<(String, String)>,
    label_map: Option<LabelMap>,
    config: TrainingConfig,
}

impl ClassifierBuilder {
    const MAX_CATEGORY_LENGTH: usize = 100;
    const MAX_CATEGORIES: usize = 1000;

    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use spendcat::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the training hyperparameters
    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses an existing label map instead of deriving one from the examples.
    /// Every training category must have an entry in it.
    pub fn with_label_map(mut self, label_map: LabelMap) -> Self {
        self.label_map = Some(label_map);
        self
    }

    fn validate_example(text: &str, category: &str) -> Result<(String, String), ClassifierError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(ClassifierError::ValidationError("Category name cannot be empty".into()));
        }
        if category.chars().count() > Self::MAX_CATEGORY_LENGTH {
            return Err(ClassifierError::ValidationError(format!(
                "Category name is too long ({} chars, max is {})",
                category.chars().count(),
                Self::MAX_CATEGORY_LENGTH
            )));
        }

        let clean = clean_text(text);
        if clean.is_empty() {
            return Err(ClassifierError::ValidationError(format!(
                "Example {:?} for category '{}' is empty after cleaning",
                text, category
            )));
        }

        Ok((clean, category.to_string()))
    }

    /// Adds a category and all of its examples
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The category name is empty or too long
    ///   - No examples are provided
    ///   - Any example is empty after cleaning
    pub fn add_category(mut self, category: CategoryDefinition) -> Result<Self, ClassifierError> {
        if category.examples.is_empty() {
            return Err(ClassifierError::ValidationError(format!(
                "Category '{}' must have at least one example",
                category.name
            )));
        }

        let mut validated = Vec::with_capacity(category.examples.len());
        for example in &category.examples {
            validated.push(Self::validate_example(example, &category.name)?);
        }
        self.examples.extend(validated);
        Ok(self)
    }

    /// Adds a single `(text, category)` training example
    pub fn add_example(mut self, text: &str, category: &str) -> Result<Self, ClassifierError> {
        self.examples.push(Self::validate_example(text, category)?);
        Ok(self)
    }

    /// Adds `(text, category)` training examples in bulk
    pub fn add_examples<I, T, C>(mut self, rows: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = (T, C)>,
        T: AsRef<str>,
        C: AsRef<str>,
    {
        for (text, category) in rows {
            self.examples.push(Self::validate_example(text.as_ref(), category.as_ref())?);
        }
        Ok(self)
    }

    /// Fits the pipeline and returns it with its label map
    ///
    /// # Returns
    /// * `Result<TrainedModel, ClassifierError>` - The trained bundle if successful, or an error if:
    ///   - No examples have been added
    ///   - Fewer than two categories are present
    ///   - Too many categories are present
    ///   - A category is missing from the supplied label map
    ///   - Fitting the vectorizer or the linear model fails
    ///
    /// # Example
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use spendcat::{ClassifierBuilder, CategoryDefinition};
    ///
    /// let model = ClassifierBuilder::new()
    ///     .add_category(CategoryDefinition::new("Groceries").with_examples(vec!["kroger", "safeway"]))?
    ///     .add_category(CategoryDefinition::new("Fuel").with_examples(vec!["shell oil", "chevron"]))?
    ///     .build()?;
    ///
    /// let label = model.label_map.label_for("Fuel").unwrap();
    /// assert_eq!(model.label_map.resolve(label), "Fuel");
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<TrainedModel, ClassifierError> {
        if self.examples.is_empty() {
            return Err(ClassifierError::ValidationError("No training examples have been added".into()));
        }

        let categories: BTreeSet<&str> = self.examples.iter().map(|(_, c)| c.as_str()).collect();
        if categories.len() < 2 {
            return Err(ClassifierError::ValidationError(format!(
                "At least two categories are required, got {}",
                categories.len()
            )));
        }
        if categories.len() > Self::MAX_CATEGORIES {
            return Err(ClassifierError::ValidationError(format!(
                "Maximum number of categories ({}) exceeded",
                Self::MAX_CATEGORIES
            )));
        }

        let label_map = match self.label_map {
            Some(map) => {
                if let Some(missing) = categories.iter().find(|c| map.label_for(c).is_none()) {
                    return Err(ClassifierError::ValidationError(format!(
                        "Category '{}' is not in the supplied label map",
                        missing
                    )));
                }
                map
            }
            None => LabelMap::build(categories.iter().copied()),
        };

        let mut documents = Vec::with_capacity(self.examples.len());
        let mut labels: Vec<Label> = Vec::with_capacity(self.examples.len());
        for (text, category) in &self.examples {
            let label = label_map.label_for(category).ok_or_else(|| {
                ClassifierError::ValidationError(format!("Category '{}' has no label", category))
            })?;
            documents.push(text.as_str());
            labels.push(label);
        }

        info!(
            "Training on {} examples across {} categories",
            documents.len(),
            categories.len()
        );
        let pipeline = TextPipeline::fit(&documents, &labels, &self.config)?;

        Ok(TrainedModel { pipeline, label_map })
    }
}
