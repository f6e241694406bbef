use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::network::metadata::{InputType, ModelMetadata};
use crate::network::network::Network;
use crate::preprocess::{IMAGE_SIDE, INPUT_LEN};

/// Describes one layer in a network specification.
///
/// - `size`       : number of neurons in this layer
/// - `input_size` : output size of the previous layer, or the raw input
///                  dimension for the first layer
/// - `activation` : activation function applied after the linear transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

/// Architecture plus metadata, independent of trained weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl NetworkSpec {
    /// 4096 → 1024 (ReLU) → 512 (ReLU) → 1 (Sigmoid), fed 64×64 grayscale.
    pub fn pneumonia_classifier() -> NetworkSpec {
        NetworkSpec::dense_binary("imageclassifier", &[1024, 512])
    }

    /// A binary image classifier over 64×64 grayscale input with the given
    /// hidden ReLU widths.
    pub fn dense_binary(name: &str, hidden: &[usize]) -> NetworkSpec {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut input_size = INPUT_LEN;
        for &size in hidden {
            layers.push(LayerSpec { size, input_size, activation: ActivationFunction::ReLU });
            input_size = size;
        }
        layers.push(LayerSpec { size: 1, input_size, activation: ActivationFunction::Sigmoid });

        NetworkSpec {
            name: name.to_owned(),
            layers,
            metadata: Some(ModelMetadata {
                description: Some("Chest X-ray classifier: normal vs. pneumonia".into()),
                input_type: Some(InputType::ImageGrayscale { width: IMAGE_SIDE, height: IMAGE_SIDE }),
                output_labels: Some(vec!["normal".into(), "pneumonia".into()]),
            }),
        }
    }

    /// Instantiates freshly initialised weights for this architecture.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Network {
        let specs: Vec<_> = self.layers.iter()
            .map(|l| (l.size, l.input_size, l.activation))
            .collect();
        let mut network = Network::new(&specs, rng);
        network.metadata = self.metadata.clone();
        network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn classifier_architecture() {
        let spec = NetworkSpec::pneumonia_classifier();
        let sizes: Vec<_> = spec.layers.iter().map(|l| (l.input_size, l.size)).collect();
        assert_eq!(sizes, vec![(4096, 1024), (1024, 512), (512, 1)]);
        assert_eq!(spec.layers[2].activation, ActivationFunction::Sigmoid);
    }

    #[test]
    fn build_carries_metadata() {
        let net = NetworkSpec::dense_binary("tiny", &[4]).build(&mut StdRng::seed_from_u64(0));
        assert_eq!(net.input_size(), 4096);
        assert_eq!(net.output_size(), 1);
        assert!(net.validate_shapes().is_ok());
        assert!(net.metadata.unwrap().input_type.is_some());
    }
}
