//! Transaction CSV ingest, cleaning and train/test splits.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifacts::LABEL_MAP_FILE;
use crate::config::SplitConfig;
use crate::label_map::{LabelMap, LabelMapError};
use crate::normalize::normalize;

pub const TRAIN_FILE: &str = "train.csv";
pub const TEST_FILE: &str = "test.csv";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Label map error: {0}")]
    LabelMapError(#[from] LabelMapError),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("{0}")]
    Empty(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A raw transaction row. Columns other than these are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    pub name: String,
    pub merchant_name: Option<String>,
    pub category: Option<String>,
}

impl TransactionRecord {
    /// The cleaned training text and category, or `None` when the row cannot
    /// be used for training.
    pub fn to_labeled(&self) -> Option<LabeledText> {
        let category = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        let clean_text = normalize(&self.name, self.merchant_name.as_deref());
        if clean_text.is_empty() {
            return None;
        }
        Some(LabeledText {
            clean_text,
            category: category.to_string(),
        })
    }
}

/// A row of a split file: cleaned text and its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledText {
    pub clean_text: String,
    pub category: String,
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn field(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn read_records<R: Read>(reader: R) -> Result<(StringRecord, Vec<TransactionRecord>), DatasetError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let name = column(&headers, "name").ok_or_else(|| DatasetError::MissingColumn("name".into()))?;
    let merchant = column(&headers, "merchant_name");
    let category = column(&headers, "category");

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(TransactionRecord {
            name: record.get(name).unwrap_or_default().to_string(),
            merchant_name: field(&record, merchant),
            category: field(&record, category),
        });
    }
    Ok((headers, records))
}

/// Reads raw transactions from CSV with a header row.
///
/// `name` is required; `merchant_name` and `category` are optional columns.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, DatasetError> {
    read_records(reader).map(|(_, records)| records)
}

/// Loads a transactions CSV and turns it into training rows.
///
/// Rows without a category, or whose text is empty after cleaning, are
/// skipped. Fails when the file has no `category` column.
pub fn load_transactions<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledText>, DatasetError> {
    let path = path.as_ref();
    let (headers, records) = read_records(File::open(path)?)?;
    if column(&headers, "category").is_none() {
        return Err(DatasetError::MissingColumn("category".into()));
    }

    let total = records.len();
    let rows: Vec<LabeledText> = records.iter().filter_map(TransactionRecord::to_labeled).collect();
    if rows.len() < total {
        warn!(
            "Skipped {} of {} rows in {} without a category or usable text",
            total - rows.len(),
            total,
            path.display()
        );
    }
    Ok(rows)
}

pub fn read_labeled<R: Read>(reader: R) -> Result<Vec<LabeledText>, DatasetError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn write_labeled<W: Write>(writer: W, rows: &[LabeledText]) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<LabeledText>,
    pub test: Vec<LabeledText>,
}

/// Shuffles `rows` with a seeded generator and holds out
/// `ceil(n * test_size)` of them for testing, always keeping at least one
/// training row.
pub fn train_test_split(mut rows: Vec<LabeledText>, config: &SplitConfig) -> Result<TrainTestSplit, DatasetError> {
    config.validate()?;
    if rows.is_empty() {
        return Err(DatasetError::Empty("Cannot split an empty dataset".into()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    rows.shuffle(&mut rng);

    let n = rows.len();
    let n_test = ((n as f64 * config.test_size).ceil() as usize).min(n - 1);
    let test = rows.split_off(n - n_test);

    Ok(TrainTestSplit { train: rows, test })
}

/// What [`preprocess`] wrote.
#[derive(Debug, Clone)]
pub struct PreprocessSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub categories: usize,
    pub output_dir: PathBuf,
}

/// Cleans a raw transactions CSV and writes `train.csv`, `test.csv` and the
/// label map over all of its categories into `out_dir`.
pub fn preprocess<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    out_dir: Q,
    config: &SplitConfig,
) -> Result<PreprocessSummary, DatasetError> {
    let out_dir = out_dir.as_ref();
    let rows = load_transactions(input.as_ref())?;
    if rows.is_empty() {
        return Err(DatasetError::Empty(format!(
            "No labeled transactions in {}",
            input.as_ref().display()
        )));
    }

    let label_map = LabelMap::build(rows.iter().map(|row| row.category.as_str()));
    let split = train_test_split(rows, config)?;

    fs::create_dir_all(out_dir)?;
    write_labeled(File::create(out_dir.join(TRAIN_FILE))?, &split.train)?;
    write_labeled(File::create(out_dir.join(TEST_FILE))?, &split.test)?;
    label_map.save(out_dir.join(LABEL_MAP_FILE))?;

    info!(
        "Preprocessed {} training and {} test rows across {} categories into {}",
        split.train.len(),
        split.test.len(),
        label_map.len(),
        out_dir.display()
    );

    Ok(PreprocessSummary {
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        categories: label_map.len(),
        output_dir: out_dir.to_path_buf(),
    })
}

/// The contents of a preprocessing output directory.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train: Vec<LabeledText>,
    pub test: Vec<LabeledText>,
    /// Absent when the directory holds no label map.
    pub label_map: Option<LabelMap>,
}

/// Reads what [`preprocess`] wrote. `test.csv` and the label map are optional.
pub fn load_prepared<P: AsRef<Path>>(dir: P) -> Result<PreparedData, DatasetError> {
    let dir = dir.as_ref();
    let train = read_labeled(File::open(dir.join(TRAIN_FILE))?)?;

    let test_path = dir.join(TEST_FILE);
    let test = if test_path.exists() {
        read_labeled(File::open(test_path)?)?
    } else {
        Vec::new()
    };

    let label_map_path = dir.join(LABEL_MAP_FILE);
    let label_map = if label_map_path.exists() {
        Some(LabelMap::load(label_map_path)?)
    } else {
        None
    };

    Ok(PreparedData { train, test, label_map })
}
