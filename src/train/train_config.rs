use crate::config::{parse_var, ConfigError};

/// Hyperparameters for a `train_loop` run.
///
/// Defaults reproduce the reference training run: 50 epochs, batch 128,
/// Adam at 0.001, 20% stratified validation split, seed 42.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    /// Samples per mini-batch; `1` gives online SGD.
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of each class held out for validation.
    pub validation_fraction: f64,
    /// Seeds weight init, the split, and per-epoch shuffling.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 50,
            batch_size: 128,
            learning_rate: 0.001,
            validation_fraction: 0.2,
            seed: 42,
        }
    }
}

impl TrainConfig {
    /// Applies `XRAY_TRAIN_*` overrides from `get`.
    pub fn with_overrides<F>(mut self, get: F) -> Result<TrainConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("XRAY_TRAIN_EPOCHS") {
            self.epochs = parse_var("XRAY_TRAIN_EPOCHS", &v, "epoch count")?;
        }
        if let Some(v) = get("XRAY_TRAIN_BATCH_SIZE") {
            self.batch_size = parse_var("XRAY_TRAIN_BATCH_SIZE", &v, "batch size")?;
            if self.batch_size == 0 {
                return Err(ConfigError::Invalid { var: "XRAY_TRAIN_BATCH_SIZE", value: v, expected: "batch size" });
            }
        }
        if let Some(v) = get("XRAY_TRAIN_LEARNING_RATE") {
            self.learning_rate = parse_var("XRAY_TRAIN_LEARNING_RATE", &v, "learning rate")?;
        }
        if let Some(v) = get("XRAY_TRAIN_VALIDATION_FRACTION") {
            self.validation_fraction = parse_var("XRAY_TRAIN_VALIDATION_FRACTION", &v, "fraction")?;
            if !(0.0..1.0).contains(&self.validation_fraction) {
                return Err(ConfigError::Invalid {
                    var: "XRAY_TRAIN_VALIDATION_FRACTION",
                    value: v,
                    expected: "fraction in [0, 1)",
                });
            }
        }
        if let Some(v) = get("XRAY_TRAIN_SEED") {
            self.seed = parse_var("XRAY_TRAIN_SEED", &v, "seed")?;
        }
        Ok(self)
    }
}
