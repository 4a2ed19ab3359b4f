/// Represents the different types of errors that can occur while training or
/// running the transaction classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Error occurred while splitting text into tokens
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),
    /// Error occurred while fitting the vectorizer or the linear model
    #[error("Training error: {0}")]
    TrainingError(String),
    /// Error occurred while making predictions
    #[error("Prediction error: {0}")]
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
}
