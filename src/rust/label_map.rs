use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Numeric class identifier produced by a classifier.
pub type Label = u32;

/// Category reported for labels without a label map entry and for every
/// fallback prediction.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, thiserror::Error)]
pub enum LabelMapError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Corrupt label map: {0}")]
    Corrupt(String),
}

/// Bidirectional lookup between labels and category names.
///
/// Persisted as a CSV file with a `label,category` header. Empty categories
/// never make it into the map.
///
/// ```
/// use spendcat::{LabelMap, UNCATEGORIZED};
///
/// let map = LabelMap::build(["Utilities", "Groceries", "Dining", "Groceries"]);
/// assert_eq!(map.len(), 3);
///
/// let label = map.label_for("Groceries").unwrap();
/// assert_eq!(map.resolve(label), "Groceries");
/// assert_eq!(map.resolve(42), UNCATEGORIZED);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: BTreeMap<Label, String>,
    labels: HashMap<String, Label>,
}

impl LabelMap {
    /// Assigns labels `0..n` to the distinct, non-empty categories in
    /// lexicographic order, so the same category set always produces the
    /// same map regardless of input order.
    pub fn build<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = categories
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let entries = distinct
            .into_iter()
            .enumerate()
            .map(|(i, category)| (i as Label, category))
            .collect();

        Self::from_entries(entries)
    }

    /// Builds a map from explicit pairs. Pairs with an empty category are
    /// dropped; for a repeated label the last pair wins.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Label, S)>,
        S: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(label, category)| (label, category.into().trim().to_string()))
            .filter(|(_, category)| !category.is_empty())
            .collect();

        Self::from_entries(entries)
    }

    fn from_entries(entries: BTreeMap<Label, String>) -> Self {
        let mut labels = HashMap::with_capacity(entries.len());
        for (label, category) in &entries {
            labels.entry(category.clone()).or_insert(*label);
        }
        Self { entries, labels }
    }

    /// Reads a label map file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelMapError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Parses CSV rows into a label map.
    ///
    /// Columns are located by header name, so both `label,category` and
    /// `category,label` files are accepted. A header missing either column,
    /// or a record with fewer than two fields, is an error. Rows with an
    /// empty category or a label that is not a non-negative integer are
    /// skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LabelMapError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let label_column = headers
            .iter()
            .position(|h| h == "label")
            .ok_or_else(|| LabelMapError::Corrupt("header has no 'label' column".into()))?;
        let category_column = headers
            .iter()
            .position(|h| h == "category")
            .ok_or_else(|| LabelMapError::Corrupt("header has no 'category' column".into()))?;

        let mut entries = BTreeMap::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            // Header is line 1
            let line = index + 2;

            if record.len() < 2 {
                return Err(LabelMapError::Corrupt(format!(
                    "line {} has {} field(s), expected 2",
                    line,
                    record.len()
                )));
            }

            let category = record.get(category_column).unwrap_or_default();
            if category.is_empty() {
                log::debug!("Skipping label map line {}: empty category", line);
                continue;
            }

            let raw_label = record.get(label_column).unwrap_or_default();
            let label = match raw_label.parse::<Label>() {
                Ok(label) => label,
                Err(_) => {
                    log::debug!("Skipping label map line {}: unparsable label {:?}", line, raw_label);
                    continue;
                }
            };

            if let Some(previous) = entries.insert(label, category.to_string()) {
                log::warn!(
                    "Label {} appears more than once in label map ({:?} replaced by {:?})",
                    label, previous, category
                );
            }
        }

        Ok(Self::from_entries(entries))
    }

    /// Writes the map to disk with a `label,category` header.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LabelMapError> {
        let file = File::create(path.as_ref())?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), LabelMapError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["label", "category"])?;
        for (label, category) in &self.entries {
            csv_writer.write_record([label.to_string().as_str(), category.as_str()])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Returns the category for `label`, or [`UNCATEGORIZED`] when the label
    /// has no entry.
    pub fn resolve(&self, label: Label) -> &str {
        self.get(label).unwrap_or(UNCATEGORIZED)
    }

    pub fn get(&self, label: Label) -> Option<&str> {
        self.entries.get(&label).map(String::as_str)
    }

    pub fn label_for(&self, category: &str) -> Option<Label> {
        self.labels.get(category).copied()
    }

    pub fn contains_label(&self, label: Label) -> bool {
        self.entries.contains_key(&label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(label, category)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        self.entries.iter().map(|(label, category)| (*label, category.as_str()))
    }

    pub fn categories(&self) -> Vec<&str> {
        self.entries.values().map(String::as_str).collect()
    }
}
