use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::loss::bce::BceLoss;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::dataset::Dataset;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` with binary cross-entropy for `config.epochs` epochs and
/// returns the statistics of every completed epoch.
///
/// # Panics
/// Panics if `train` is empty or `batch_size == 0`.
pub fn train_loop(
    network: &mut Network,
    train: &Dataset,
    validation: Option<&Dataset>,
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
) -> Vec<EpochStats> {
    assert!(!train.is_empty(), "training set must not be empty");
    assert!(config.batch_size > 0, "batch_size must be at least 1");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let (train_loss, train_accuracy) = run_one_epoch(network, train, optimizer, config.batch_size, &mut rng);

        let (val_loss, val_accuracy) = match validation.filter(|v| !v.is_empty()) {
            Some(v) => {
                let (l, a) = evaluate(network, v);
                (Some(l), Some(a))
            }
            None => (None, None),
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            epoch,
            total = config.epochs,
            loss = train_loss,
            accuracy = train_accuracy,
            val_loss = ?stats.val_loss,
            val_accuracy = ?stats.val_accuracy,
            elapsed_ms = stats.elapsed_ms,
            "Epoch finished"
        );
        history.push(stats);
    }

    history
}

/// Mean BCE and thresholded accuracy over a dataset, without updating weights.
pub fn evaluate(network: &Network, data: &Dataset) -> (f64, f64) {
    let n = data.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mut total_loss = 0.0;
    let mut correct = 0usize;
    for (input, &label) in data.inputs.iter().zip(data.labels.iter()) {
        let output = network.predict(input);
        total_loss += BceLoss::loss(&output, &[label]);
        if is_correct(output[0], label) {
            correct += 1;
        }
    }
    (total_loss / n as f64, correct as f64 / n as f64)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// One full pass of mini-batch gradient descent. Returns (mean loss, accuracy).
fn run_one_epoch(
    network: &mut Network,
    data: &Dataset,
    optimizer: &mut dyn Optimizer,
    batch_size: usize,
    rng: &mut StdRng,
) -> (f64, f64) {
    let n = data.len();
    let mut total_loss = 0.0;
    let mut correct = 0usize;

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    for batch in indices.chunks(batch_size) {
        let mut acc_grads: Vec<(Matrix, Matrix)> = network.layers.iter()
            .map(|layer| (
                Matrix::zeros(layer.weights.rows, layer.weights.cols),
                Matrix::zeros(layer.biases.rows, layer.biases.cols),
            ))
            .collect();

        for &idx in batch {
            let input    = &data.inputs[idx];
            let expected = [data.labels[idx]];

            let output = network.forward(input);
            total_loss += BceLoss::loss(&output, &expected);
            if is_correct(output[0], expected[0]) {
                correct += 1;
            }

            let mut delta = Matrix::row(&BceLoss::derivative(&output, &expected));

            // Backward pass.
            for i in (0..network.layers.len()).rev() {
                let input_for_layer = if i == 0 {
                    Matrix::row(input)
                } else {
                    network.layers[i - 1].neurons.clone()
                };

                let (w_grad, b_grad) = network.layers[i].compute_gradients(&delta, &input_for_layer);

                if i > 0 {
                    delta = &b_grad * &network.layers[i].weights.transpose();
                }

                acc_grads[i].0.add_scaled(&w_grad, 1.0);
                acc_grads[i].1.add_scaled(&b_grad, 1.0);
            }
        }

        let inv_batch = 1.0 / batch.len() as f64;
        for (i, (w_acc, b_acc)) in acc_grads.into_iter().enumerate() {
            let w_avg = w_acc.map(|x| x * inv_batch);
            let b_avg = b_acc.map(|x| x * inv_batch);
            optimizer.step(i, &mut network.layers[i], &w_avg, &b_avg);
        }
    }

    (total_loss / n as f64, correct as f64 / n as f64)
}

fn is_correct(probability: f64, label: f64) -> bool {
    (probability.round_ties_even() - label).abs() < f64::EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::optim::{Adam, Sgd};

    /// Two linearly separable clusters in 2-D.
    fn toy() -> Dataset {
        let mut inputs = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = i as f64 * 0.01;
            inputs.push(vec![0.1 + jitter, 0.2]);
            labels.push(0.0);
            inputs.push(vec![0.9 - jitter, 0.8]);
            labels.push(1.0);
        }
        Dataset { inputs, labels }
    }

    fn net() -> Network {
        Network::new(
            &[(4, 2, ActivationFunction::ReLU), (1, 4, ActivationFunction::Sigmoid)],
            &mut StdRng::seed_from_u64(9),
        )
    }

    fn config(epochs: usize) -> TrainConfig {
        TrainConfig { epochs, batch_size: 8, learning_rate: 0.05, validation_fraction: 0.0, seed: 1 }
    }

    #[test]
    fn adam_reduces_loss_on_separable_data() {
        let data = toy();
        let mut network = net();
        let (before, _) = evaluate(&network, &data);
        let mut adam = Adam::new(0.05);
        let history = train_loop(&mut network, &data, Some(&data), &mut adam, &config(60));
        let last = history.last().unwrap();
        assert_eq!(history.len(), 60);
        assert!(last.train_loss < before, "{} !< {}", last.train_loss, before);
        assert!(last.val_accuracy.unwrap() >= 0.9);
    }

    #[test]
    fn sgd_also_learns() {
        let data = toy();
        let mut network = net();
        let mut sgd = Sgd::new(0.5);
        let history = train_loop(&mut network, &data, None, &mut sgd, &config(200));
        assert!(history.last().unwrap().train_loss < history[0].train_loss);
        assert!(history[0].val_loss.is_none());
    }

    #[test]
    fn same_seed_same_weights() {
        let data = toy();
        let mut a = net();
        let mut b = net();
        train_loop(&mut a, &data, None, &mut Adam::new(0.01), &config(3));
        train_loop(&mut b, &data, None, &mut Adam::new(0.01), &config(3));
        assert_eq!(a.layers[0].weights, b.layers[0].weights);
    }
}
