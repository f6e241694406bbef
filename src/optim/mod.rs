pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::Sgd;

use crate::{layers::dense::Layer, math::matrix::Matrix};

/// Applies one parameter update per layer per mini-batch.
///
/// `layer_index` lets stateful optimizers keep per-layer moment estimates.
pub trait Optimizer {
    fn step(&mut self, layer_index: usize, layer: &mut Layer, weights_grad: &Matrix, biases_grad: &Matrix);
}
