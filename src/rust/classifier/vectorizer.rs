use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use super::error::ClassifierError;
use super::utils::{normalize_sparse, SparseVector};

/// Term-frequency / inverse-document-frequency featurizer.
///
/// Text is split with the `tokenizers` whitespace pre-tokenizer
/// (`\w+|[^\w\s]+`) and only tokens made of two or more word characters are
/// kept. Vocabulary indices follow alphabetical order so that fitting the same
/// corpus twice yields an identical artifact.
///
/// Feature values are raw term counts scaled by a smoothed idf,
/// `ln((1 + n) / (1 + df)) + 1`, then l2-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Array1<f32>,
}

impl TfIdfVectorizer {
    /// Learns the vocabulary and idf weights from a corpus.
    ///
    /// # Errors
    /// - `TrainingError` if the corpus is empty
    /// - `TrainingError` if no document contains a usable token
    /// - `TokenizerError` if pre-tokenization fails
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Result<Self, ClassifierError> {
        if documents.is_empty() {
            return Err(ClassifierError::TrainingError(
                "Cannot fit vectorizer on an empty corpus".into(),
            ));
        }

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for document in documents {
            let unique_tokens: BTreeSet<String> =
                Self::tokenize(document.as_ref())?.into_iter().collect();
            for token in unique_tokens {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(ClassifierError::TrainingError(
                "Empty vocabulary: no document contains a token of two or more word characters".into(),
            ));
        }

        let n_documents = documents.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Array1::zeros(document_frequency.len());
        for (index, (token, df)) in document_frequency.into_iter().enumerate() {
            idf[index] = ((1.0 + n_documents) / (1.0 + df as f32)).ln() + 1.0;
            vocabulary.insert(token, index);
        }

        log::debug!("Fitted vectorizer: {} documents, {} terms", documents.len(), vocabulary.len());
        Ok(Self { vocabulary, idf })
    }

    /// Splits text into lowercase vocabulary candidates.
    pub fn tokenize(text: &str) -> Result<Vec<String>, ClassifierError> {
        let lowered = text.to_lowercase();
        let mut pretokenized = PreTokenizedString::from(lowered.as_str());
        Whitespace::default()
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;

        let tokens: Vec<String> = pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(token, _, _)| token)
            .filter(|token| Self::is_term(token))
            .map(str::to_owned)
            .collect();
        Ok(tokens)
    }

    /// Counts the tokens the vectorizer would consider, known or not.
    pub fn count_tokens(text: &str) -> Result<usize, ClassifierError> {
        Self::tokenize(text).map(|tokens| tokens.len())
    }

    fn is_term(token: &str) -> bool {
        token.chars().count() >= 2 && token.chars().all(|c| c.is_alphanumeric() || c == '_')
    }

    /// Converts a document into an l2-normalized sparse tf-idf vector.
    /// Tokens outside the vocabulary are ignored; a document with no known
    /// token yields an empty vector.
    pub fn transform(&self, document: &str) -> Result<SparseVector, ClassifierError> {
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for token in Self::tokenize(document)? {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut features = Vec::with_capacity(counts.len());
        for (index, count) in counts {
            let idf = self.idf.get(index).copied().ok_or_else(|| {
                ClassifierError::PredictionError(format!("Vocabulary index {} has no idf weight", index))
            })?;
            features.push((index, count * idf));
        }

        normalize_sparse(&mut features);
        Ok(features)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Checks internal consistency of a deserialized vectorizer.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.vocabulary.is_empty() {
            return Err("vectorizer vocabulary is empty".into());
        }
        if self.idf.len() != self.vocabulary.len() {
            return Err(format!(
                "vectorizer has {} idf weights for {} terms",
                self.idf.len(),
                self.vocabulary.len()
            ));
        }
        if let Some((term, index)) = self.vocabulary.iter().find(|(_, index)| **index >= self.idf.len()) {
            return Err(format!("term {:?} has out-of-range index {}", term, index));
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err("vectorizer has non-finite idf weights".into());
        }
        Ok(())
    }
}
