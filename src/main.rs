/// Offline trainer for the pneumonia classifier.
///
/// Usage:
///   xray-train <dataset_dir> [output_path]
///
/// `<dataset_dir>` holds one folder per class (`Normal/` is label 0, every
/// other folder is label 1). The trained network is written as JSON, by
/// default to `trained_models/imageclassifier.json`.
///
/// Hyperparameters can be overridden with `XRAY_TRAIN_EPOCHS`,
/// `XRAY_TRAIN_BATCH_SIZE`, `XRAY_TRAIN_LEARNING_RATE`,
/// `XRAY_TRAIN_VALIDATION_FRACTION` and `XRAY_TRAIN_SEED`.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use xray_diagnosis::config::{default_log_filter, APP_VERSION, DEFAULT_MODEL_PATH};
use xray_diagnosis::{train_loop, Adam, Dataset, NetworkSpec, TrainConfig};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_filter())))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(data_dir) = args.next().map(PathBuf::from) else {
        eprintln!("usage: xray-train <dataset_dir> [output_path]");
        return ExitCode::from(2);
    };
    let output = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

    match run(data_dir, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Training failed");
            ExitCode::FAILURE
        }
    }
}

fn run(data_dir: PathBuf, output: PathBuf) -> Result<(), Box<dyn Error>> {
    let config = TrainConfig::default().with_overrides(|k| std::env::var(k).ok())?;
    tracing::info!(version = APP_VERSION, data = %data_dir.display(), ?config, "Starting training");

    let mut data = Dataset::load_dir(&data_dir)?;
    data.normalize_by_max();
    let (normal, pneumonia) = data.class_counts();
    tracing::info!(samples = data.len(), normal, pneumonia, "Dataset loaded");

    let (train, validation) = data.stratified_split(config.validation_fraction, config.seed)?;
    tracing::info!(train = train.len(), validation = validation.len(), "Stratified split");

    let spec = NetworkSpec::pneumonia_classifier();
    let mut network = spec.build(&mut StdRng::seed_from_u64(config.seed));
    let mut optimizer = Adam::new(config.learning_rate);

    let history = train_loop(&mut network, &train, Some(&validation), &mut optimizer, &config);

    if let Some(last) = history.last() {
        tracing::info!(
            train_loss = last.train_loss,
            train_accuracy = last.train_accuracy,
            val_loss = last.val_loss,
            val_accuracy = last.val_accuracy,
            "Training finished"
        );
    }

    if let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    network.save_json(&output)?;
    tracing::info!(path = %output.display(), "Model saved");
    Ok(())
}
