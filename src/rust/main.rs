use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use spendcat::training::{self, TrainingOutcome};
use spendcat::{dataset, ArtifactStore, Predictor, SplitConfig, TrainingConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the classifier and label map artifacts
    #[arg(long, global = true, env = "SPENDCAT_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict the category of one transaction and print it as JSON
    Predict {
        /// Transaction description as it appears on the statement
        description: Option<String>,
        /// Merchant name, if known
        merchant: Option<String>,
    },
    /// Clean a raw transactions CSV and write train/test splits and the label map
    Preprocess {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Train on preprocessed splits, print the test report and save the model
    Train {
        #[arg(long)]
        data_dir: PathBuf,
        #[command(flatten)]
        training: TrainingArgs,
    },
    /// Retrain from a corrected-transactions CSV and replace the saved model
    Retrain {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        training: TrainingArgs,
    },
    /// Report whether the model artifacts can be loaded
    Health,
    /// Categorize a handful of well-known merchants
    Demo,
}

#[derive(clap::Args)]
struct TrainingArgs {
    #[arg(long, default_value_t = 1000)]
    max_iter: usize,
    /// Inverse regularization strength
    #[arg(long, default_value_t = 1.0)]
    c: f32,
    #[arg(long, default_value_t = 1.0)]
    learning_rate: f32,
}

impl From<TrainingArgs> for TrainingConfig {
    fn from(args: TrainingArgs) -> Self {
        Self {
            max_iter: args.max_iter,
            c: args.c,
            learning_rate: args.learning_rate,
            ..Default::default()
        }
    }
}

const DEMO_TRANSACTIONS: &[(&str, Option<&str>)] = &[
    ("STARBUCKS COFFEE", Some("Starbucks")),
    ("WALMART SUPERCENTER", None),
    ("SHELL GAS STATION", Some("Shell")),
    ("AMAZON.COM", None),
    ("MCDONALDS", None),
    ("Target Store", None),
];

fn main() -> anyhow::Result<ExitCode> {
    spendcat::init_logger();
    let args = Args::parse();

    let store = match args.model_dir {
        Some(dir) => ArtifactStore::new(dir),
        None => ArtifactStore::new_default(),
    };

    match args.command {
        Command::Predict { description, merchant } => {
            let Some(description) = description.filter(|d| !d.trim().is_empty()) else {
                println!("{}", json!({"error": "Transaction description required"}));
                return Ok(ExitCode::FAILURE);
            };
            let predictor = Predictor::new(store);
            let result = predictor.predict(&description, merchant.as_deref());
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Preprocess { input, output_dir, test_size, seed } => {
            let config = SplitConfig { test_size, seed };
            let summary = dataset::preprocess(&input, &output_dir, &config)
                .with_context(|| format!("Failed to preprocess {}", input.display()))?;
            println!(
                "Wrote {} training and {} test rows ({} categories) to {}",
                summary.train_rows,
                summary.test_rows,
                summary.categories,
                summary.output_dir.display()
            );
        }
        Command::Train { data_dir, training: params } => {
            let start = Instant::now();
            let TrainingOutcome { model, report } =
                training::train_from_dir(&data_dir, &store, &params.into())
                    .with_context(|| format!("Failed to train from {}", data_dir.display()))?;
            info!("Training took {:.2?}", start.elapsed());

            match report {
                Some(report) => println!("{}", report),
                None => println!("No test rows; skipped evaluation"),
            }
            println!(
                "Saved {} categories to {}",
                model.label_map.len(),
                store.model_dir().display()
            );
        }
        Command::Retrain { input, training: params } => {
            let model = training::retrain(&input, &store, &params.into())
                .with_context(|| format!("Failed to retrain from {}", input.display()))?;
            println!(
                "{}",
                json!({
                    "message": "Model retrained successfully",
                    "categories": model.label_map.len(),
                    "model_dir": store.model_dir().display().to_string(),
                })
            );
        }
        Command::Health => {
            let model_dir = store.model_dir().display().to_string();
            let predictor = Predictor::new(store);
            let ready = predictor.load();
            println!(
                "{}",
                json!({
                    "ready": ready,
                    "model_dir": model_dir,
                    "error": predictor.load_error(),
                })
            );
            if !ready {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Demo => {
            let predictor = Predictor::new(store);
            for (description, merchant) in DEMO_TRANSACTIONS {
                let result = predictor.predict(description, *merchant);
                println!(
                    "{:<22} {:<12} -> {} ({:.2}){}",
                    description,
                    merchant.unwrap_or("-"),
                    result.category,
                    result.confidence,
                    result.error.map(|e| format!(" [{}]", e)).unwrap_or_default()
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
