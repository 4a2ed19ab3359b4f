use spendcat::dataset::{self, DatasetError, TEST_FILE, TRAIN_FILE};
use spendcat::training::{self, TrainError};
use spendcat::{ArtifactStore, LabelMap, Predictor, SplitConfig, TrainingConfig};
use std::fs;

const TRANSACTIONS: &str = "\
name,merchant_name,amount,category
STARBUCKS COFFEE #1203,Starbucks,4.50,Dining
MCDONALDS F2345,McDonald's,8.10,Dining
CHIPOTLE 0921,Chipotle,11.25,Dining
STARBUCKS STORE 44,Starbucks,5.75,Dining
WALMART SUPERCENTER,Walmart,54.12,Groceries
KROGER #221,Kroger,33.09,Groceries
WHOLE FOODS MARKET,Whole Foods,71.40,Groceries
SAFEWAY 1187,Safeway,28.60,Groceries
SHELL OIL 5745,Shell,40.00,Gas
CHEVRON 0091,Chevron,38.20,Gas
EXXONMOBIL 4432,Exxon,45.10,Gas
SHELL SERVICE STATION,Shell,30.00,Gas
MYSTERY PAYMENT,,12.00,
";

#[test]
fn test_preprocess_writes_splits_and_label_map() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("transactions.csv");
    fs::write(&input, TRANSACTIONS)?;
    let out = dir.path().join("processed");

    let summary = dataset::preprocess(&input, &out, &SplitConfig::default())?;
    assert_eq!(summary.train_rows + summary.test_rows, 12);
    assert_eq!(summary.test_rows, 3);
    assert_eq!(summary.categories, 3);

    assert!(fs::read_to_string(out.join(TRAIN_FILE))?.starts_with("clean_text,category\n"));
    assert!(out.join(TEST_FILE).exists());

    let prepared = dataset::load_prepared(&out)?;
    assert_eq!(prepared.train.len(), summary.train_rows);
    assert_eq!(prepared.label_map, Some(LabelMap::build(["Dining", "Groceries", "Gas"])));
    assert!(prepared
        .train
        .iter()
        .chain(&prepared.test)
        .any(|row| row.clean_text == "starbucks coffee 1203 starbucks"));
    Ok(())
}

#[test]
fn test_preprocess_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("transactions.csv");
    fs::write(&input, TRANSACTIONS)?;

    let config = SplitConfig { test_size: 0.25, seed: 1234 };
    dataset::preprocess(&input, dir.path().join("a"), &config)?;
    dataset::preprocess(&input, dir.path().join("b"), &config)?;

    for file in [TRAIN_FILE, TEST_FILE] {
        assert_eq!(
            fs::read_to_string(dir.path().join("a").join(file))?,
            fs::read_to_string(dir.path().join("b").join(file))?
        );
    }
    Ok(())
}

#[test]
fn test_preprocess_requires_category_column() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("transactions.csv");
    fs::write(&input, "name,amount\nKROGER,10.00\n")?;

    let result = dataset::preprocess(&input, dir.path().join("out"), &SplitConfig::default());
    assert!(matches!(result, Err(DatasetError::MissingColumn(c)) if c == "category"));
    Ok(())
}

#[test]
fn test_train_from_preprocessed_dir() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("transactions.csv");
    fs::write(&input, TRANSACTIONS)?;
    let data_dir = dir.path().join("processed");
    dataset::preprocess(&input, &data_dir, &SplitConfig::default())?;

    let store = ArtifactStore::new(dir.path().join("models"));
    let outcome = training::train_from_dir(&data_dir, &store, &TrainingConfig::default())?;
    let report = outcome.report.unwrap();
    assert_eq!(report.total, 3);
    assert!(store.is_ready());

    let predictor = Predictor::new(store);
    let result = predictor.predict("SHELL OIL 9999", Some("Shell"));
    assert!(result.error.is_none());
    assert!(["Dining", "Groceries", "Gas"].contains(&result.category.as_str()));
    Ok(())
}

#[test]
fn test_retrain_from_corrections() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let corrections = dir.path().join("corrections.csv");
    fs::write(
        &corrections,
        "name,amount,category\nNETFLIX.COM,15.49,Entertainment\nSPOTIFY USA,9.99,Entertainment\n\
         COMCAST CABLE,80.00,Utilities\nPG&E WEB ONLINE,120.00,Utilities\n",
    )?;

    let store = ArtifactStore::new(dir.path().join("models"));
    let model = training::retrain(&corrections, &store, &TrainingConfig::default())?;
    assert_eq!(model.label_map.categories(), vec!["Entertainment", "Utilities"]);

    let predictor = Predictor::new(store);
    assert_eq!(predictor.predict("NETFLIX.COM", None).category, "Entertainment");
    Ok(())
}

#[test]
fn test_retrain_rejects_empty_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let corrections = dir.path().join("corrections.csv");
    fs::write(&corrections, "name,amount,category\n")?;

    let store = ArtifactStore::new(dir.path().join("models"));
    let result = training::retrain(&corrections, &store, &TrainingConfig::default());
    assert!(matches!(result, Err(TrainError::Dataset(DatasetError::Empty(_)))));
    assert!(!store.is_ready());
    Ok(())
}
