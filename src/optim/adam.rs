use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::Optimizer;

/// First and second moment estimates for one layer's parameters.
struct Moments {
    m_w: Matrix,
    v_w: Matrix,
    m_b: Matrix,
    v_b: Matrix,
    t: i32,
}

impl Moments {
    fn for_layer(layer: &Layer) -> Moments {
        let (wr, wc) = (layer.weights.rows, layer.weights.cols);
        let (br, bc) = (layer.biases.rows, layer.biases.cols);
        Moments {
            m_w: Matrix::zeros(wr, wc),
            v_w: Matrix::zeros(wr, wc),
            m_b: Matrix::zeros(br, bc),
            v_b: Matrix::zeros(br, bc),
            t: 0,
        }
    }
}

/// Adam with bias correction. Defaults match the usual Keras settings.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    state: Vec<Option<Moments>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam { learning_rate, beta1: 0.9, beta2: 0.999, epsilon: 1e-7, state: Vec::new() }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new(0.001)
    }
}

#[allow(clippy::too_many_arguments)]
fn update(param: &mut Matrix, grad: &Matrix, m: &mut Matrix, v: &mut Matrix, lr_t: f64, b1: f64, b2: f64, eps: f64) {
    for i in 0..param.rows {
        for j in 0..param.cols {
            let g = grad.data[i][j];
            let mi = b1 * m.data[i][j] + (1.0 - b1) * g;
            let vi = b2 * v.data[i][j] + (1.0 - b2) * g * g;
            m.data[i][j] = mi;
            v.data[i][j] = vi;
            param.data[i][j] -= lr_t * mi / (vi.sqrt() + eps);
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, layer_index: usize, layer: &mut Layer, weights_grad: &Matrix, biases_grad: &Matrix) {
        if self.state.len() <= layer_index {
            self.state.resize_with(layer_index + 1, || None);
        }
        let moments = self.state[layer_index].get_or_insert_with(|| Moments::for_layer(layer));
        moments.t += 1;

        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let lr_t = self.learning_rate * (1.0 - b2.powi(moments.t)).sqrt() / (1.0 - b1.powi(moments.t));

        update(&mut layer.weights, weights_grad, &mut moments.m_w, &mut moments.v_w, lr_t, b1, b2, eps);
        update(&mut layer.biases, biases_grad, &mut moments.m_b, &mut moments.v_b, lr_t, b1, b2, eps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn first_step_moves_each_weight_by_about_lr() {
        let mut layer = Layer::new(2, 2, ActivationFunction::Sigmoid, &mut StdRng::seed_from_u64(5));
        let before = layer.weights.clone();
        let grad_w = Matrix::from_data(vec![vec![0.5, -2.0], vec![3.0, -0.1]]);
        let grad_b = Matrix::from_data(vec![vec![1.0, -1.0]]);

        let mut adam = Adam::new(0.01);
        adam.step(0, &mut layer, &grad_w, &grad_b);

        for i in 0..2 {
            for j in 0..2 {
                let delta = before.data[i][j] - layer.weights.data[i][j];
                assert!((delta.abs() - 0.01).abs() < 1e-4, "delta {delta}");
                assert_eq!(delta.signum(), grad_w.data[i][j].signum());
            }
        }
    }
}
