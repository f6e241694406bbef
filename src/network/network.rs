use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, layers::dense::Layer};
use crate::network::metadata::ModelMetadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new<R: Rng + ?Sized>(
        layer_specs: &[(usize, usize, ActivationFunction)],
        rng: &mut R,
    ) -> Network {
        let layers = layer_specs.iter()
            .map(|&(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Network { layers, metadata: None }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    /// Checks that every layer's fan-in equals the previous layer's width and
    /// that the stored matrices agree with the declared sizes.
    pub fn validate_shapes(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err("network has no layers".into());
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.cols != layer.size || layer.biases.cols != layer.size || layer.biases.rows != 1 {
                return Err(format!("layer {i}: parameter shapes do not match size {}", layer.size));
            }
            if layer.weights.data.len() != layer.weights.rows
                || layer.weights.data.iter().any(|row| row.len() != layer.weights.cols)
            {
                return Err(format!("layer {i}: ragged weight matrix"));
            }
            if layer.biases.data.len() != 1 || layer.biases.data[0].len() != layer.size {
                return Err(format!("layer {i}: bias row does not have {} entries", layer.size));
            }
            if i > 0 && layer.input_size() != self.layers[i - 1].size {
                return Err(format!(
                    "layer {i}: expects {} inputs but layer {} has {} neurons",
                    layer.input_size(), i - 1, self.layers[i - 1].size
                ));
            }
        }
        Ok(())
    }

    /// Forward pass; stores activations in each layer for backprop.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.feed_from(&current);
        }
        current
    }

    /// Read-only forward pass, safe to call from many threads at once.
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Serializes the network weights to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> std::io::Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn small() -> Network {
        Network::new(
            &[(3, 4, ActivationFunction::ReLU), (1, 3, ActivationFunction::Sigmoid)],
            &mut StdRng::seed_from_u64(11),
        )
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        let net = small();
        net.save_json(&path).unwrap();
        let loaded = Network::load_json(&path).unwrap();
        let x = [0.3, 0.1, 0.7, 0.0];
        assert_eq!(net.predict(&x), loaded.predict(&x));
        assert!(loaded.validate_shapes().is_ok());
    }

    #[test]
    fn validate_rejects_broken_chain() {
        let mut net = small();
        net.layers[1] = Layer::new(1, 5, ActivationFunction::Sigmoid, &mut StdRng::seed_from_u64(1));
        assert!(net.validate_shapes().is_err());
    }

    #[test]
    fn validate_rejects_short_bias_row() {
        let mut net = small();
        net.layers[0].biases.data[0].truncate(2);
        assert!(net.validate_shapes().unwrap_err().contains("bias"));
        net.layers[0].biases.data.clear();
        assert!(net.validate_shapes().is_err());
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{\"not\": \"a network\"}").unwrap();
        let err = Network::load_json(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
