//! The pneumonia classifier held by the server for its whole lifetime.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activation::activation::ActivationFunction;
use crate::network::{InputType, Network};
use crate::preprocess::{IMAGE_SIDE, INPUT_LEN};

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Could not load model from {path}: {source}")]
    Load { path: String, source: std::io::Error },

    #[error("Model is not a {expected}-input binary classifier: {reason}")]
    Shape { expected: usize, reason: String },

    #[error("Input has {got} values, classifier expects {expected}")]
    InputLength { expected: usize, got: usize },

    #[error("Classifier produced a non-finite output")]
    NonFinite,
}

/// Condition label stored on a Diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Normal,
    Pneumonia,
}

impl Condition {
    /// round(p) == 1 → pneumonia, rounding half to even, so exactly 0.5 is normal.
    pub fn from_probability(probability: f64) -> Condition {
        if probability.round_ties_even() >= 1.0 { Condition::Pneumonia } else { Condition::Normal }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Normal => "normal",
            Condition::Pneumonia => "pneumonia",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classifier invocation: the raw sigmoid output and its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub condition: Condition,
    /// Raw probability of the positive (pneumonia) class.
    pub confidence: f64,
}

impl Prediction {
    pub fn from_probability(probability: f64) -> Prediction {
        Prediction { condition: Condition::from_probability(probability), confidence: probability }
    }
}

/// A validated, read-only network. `predict` takes `&self`, so one instance
/// behind an `Arc` serves every request thread without locking.
#[derive(Debug)]
pub struct Classifier {
    network: Network,
}

impl Classifier {
    /// Loads and validates the weights artifact written by `xray-train`.
    pub fn load(path: &Path) -> Result<Classifier, ClassifierError> {
        let network = Network::load_json(path).map_err(|source| ClassifierError::Load {
            path: path.display().to_string(),
            source,
        })?;
        let classifier = Classifier::from_network(network)?;
        tracing::info!(
            path = %path.display(),
            layers = classifier.network.layers.len(),
            "Classifier loaded"
        );
        Ok(classifier)
    }

    pub fn from_network(network: Network) -> Result<Classifier, ClassifierError> {
        let shape_err = |reason: String| ClassifierError::Shape { expected: INPUT_LEN, reason };

        network.validate_shapes().map_err(shape_err)?;
        if network.input_size() != INPUT_LEN {
            return Err(shape_err(format!("first layer takes {} inputs", network.input_size())));
        }
        if network.output_size() != 1 {
            return Err(shape_err(format!("last layer has {} outputs", network.output_size())));
        }
        if let Some(last) = network.layers.last() {
            if last.activator != ActivationFunction::Sigmoid {
                return Err(shape_err("output layer is not sigmoid".into()));
            }
        }
        let declared = network.metadata.as_ref().and_then(|m| m.input_type.as_ref());
        if let Some(InputType::ImageGrayscale { width, height }) = declared {
            if (*width, *height) != (IMAGE_SIDE, IMAGE_SIDE) {
                return Err(shape_err(format!("declares {width}x{height} input")));
            }
        }
        Ok(Classifier { network })
    }

    /// Probability of pneumonia for one preprocessed image, in [0, 1].
    pub fn probability(&self, input: &[f64]) -> Result<f64, ClassifierError> {
        if input.len() != INPUT_LEN {
            return Err(ClassifierError::InputLength { expected: INPUT_LEN, got: input.len() });
        }
        let output = self.network.predict(input);
        match output.first() {
            Some(&p) if p.is_finite() => Ok(p.clamp(0.0, 1.0)),
            _ => Err(ClassifierError::NonFinite),
        }
    }

    pub fn predict(&self, input: &[f64]) -> Result<Prediction, ClassifierError> {
        self.probability(input).map(Prediction::from_probability)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::{rngs::StdRng, SeedableRng};

    use super::Classifier;
    use crate::network::NetworkSpec;

    /// 4096 → 8 → 1 with fixed weights; fast enough for unit tests.
    pub fn tiny_classifier() -> Classifier {
        let network = NetworkSpec::dense_binary("tiny", &[8]).build(&mut StdRng::seed_from_u64(42));
        Classifier::from_network(network).unwrap()
    }
}
