use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    /// Shape (input_size, size).
    pub weights: Matrix,
    /// Shape (1, size).
    pub biases: Matrix,
    pub activator: ActivationFunction,
    /// Activations of the last training forward pass.
    #[serde(skip)]
    pub neurons: Matrix,
    /// Pre-activation values (z = xW + b) of the last training forward pass.
    #[serde(skip)]
    pre_neurons: Matrix,
}

impl Layer {
    /// He-initialised weights for ReLU layers, Xavier for Sigmoid; zero biases.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, size, rng),
            ActivationFunction::Sigmoid => Matrix::xavier(input_size, size, rng),
        };

        Layer {
            size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            neurons: Matrix::default(),
            pre_neurons: Matrix::default(),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Pure forward pass used at inference time.
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let z = &(&Matrix::row(input) * &self.weights) + &self.biases;
        z.data[0].iter().map(|&x| self.activator.function(x)).collect()
    }

    /// Training forward pass; caches z and a for the backward pass.
    pub fn feed_from(&mut self, input: &[f64]) -> Vec<f64> {
        let z = &(&Matrix::row(input) * &self.weights) + &self.biases;
        let a = z.map(|x| self.activator.function(x));
        self.pre_neurons = z;
        self.neurons = a;
        self.neurons.data[0].clone()
    }

    /// Computes gradient adjustments. Returns (weights_grad, biases_grad).
    /// `next_layer_delta` is ∂L/∂a for this layer (error in activation space).
    pub fn compute_gradients(
        &self,
        next_layer_delta: &Matrix,
        inputs: &Matrix,
    ) -> (Matrix, Matrix) {
        // derivative(z), not derivative(a)
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        let layer_delta = next_layer_delta.hadamard(&act_derivative);

        let weights_adjustment = &inputs.transpose() * &layer_delta;
        (weights_adjustment, layer_delta)
    }

    /// Plain gradient-descent update scaled by `lr`.
    pub fn apply_gradients(&mut self, weights_grad: &Matrix, biases_grad: &Matrix, lr: f64) {
        self.weights.add_scaled(weights_grad, -lr);
        self.biases.add_scaled(biases_grad, -lr);
    }
}
