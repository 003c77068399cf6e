use crate::network::{Batch, Sequential};

const PROBABILITY_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    step: i32,
    first_moments: Vec<Vec<f32>>,
    second_moments: Vec<Vec<f32>>,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32) -> Adam {
        Adam {
            learning_rate,
            beta1,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            first_moments: Vec::new(),
            second_moments: Vec::new(),
        }
    }

    /// Applies the accumulated gradients of `network`, then clears them.
    pub fn step(&mut self, network: &mut Sequential) {
        self.step += 1;
        let correction1 = 1.0 - self.beta1.powi(self.step);
        let correction2 = 1.0 - self.beta2.powi(self.step);
        for (k, (values, grads)) in network.parameters().into_iter().enumerate() {
            if self.first_moments.len() <= k {
                self.first_moments.push(vec![0.0; values.len()]);
                self.second_moments.push(vec![0.0; values.len()]);
            }
            let m = &mut self.first_moments[k];
            let v = &mut self.second_moments[k];
            for i in 0..values.len() {
                m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * grads[i];
                v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * grads[i] * grads[i];
                let m_hat = m[i] / correction1;
                let v_hat = v[i] / correction2;
                values[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
        network.zero_grad();
    }
}

/// Mean binary cross-entropy of single-output predictions against a constant
/// label, with the gradient w.r.t. each prediction.
pub fn binary_cross_entropy(predictions: &Batch, label: f32) -> (f32, Batch) {
    let n = predictions.len().max(1) as f32;
    let mut loss = 0.0;
    let grads = predictions
        .iter()
        .map(|row| {
            let p = row[0].clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
            loss -= label * p.ln() + (1.0 - label) * (1.0 - p).ln();
            vec![(p - label) / (p * (1.0 - p)) / n]
        })
        .collect();
    (loss / n, grads)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::network::{Activation, Dense, Layer};

    #[test]
    fn cross_entropy_of_confident_predictions() {
        let (loss, grads) = binary_cross_entropy(&vec![vec![0.5], vec![0.5]], 1.0);
        assert!((loss - 2f32.ln()).abs() < 1e-6);
        assert!(grads.iter().all(|g| g[0] < 0.0));

        let (good, _) = binary_cross_entropy(&vec![vec![0.99]], 1.0);
        let (bad, _) = binary_cross_entropy(&vec![vec![0.01]], 1.0);
        assert!(good < bad);
        let (clamped, _) = binary_cross_entropy(&vec![vec![0.0]], 1.0);
        assert!(clamped.is_finite());
    }

    #[test]
    fn adam_reduces_loss_on_a_separable_problem() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut net = Sequential::new(vec![Layer::Dense(Dense::new(1, 1, Activation::Sigmoid, &mut rng))]);
        let mut adam = Adam::new(0.05, 0.9);
        let positives = vec![vec![2.0], vec![1.5], vec![3.0]];

        let initial = binary_cross_entropy(&net.predict_batch(&positives).unwrap(), 1.0).0;
        for _ in 0..200 {
            let out = net.forward_train(&positives, &mut rng).unwrap();
            let (_, grad) = binary_cross_entropy(&out, 1.0);
            net.backward(&grad);
            adam.step(&mut net);
        }
        let trained = binary_cross_entropy(&net.predict_batch(&positives).unwrap(), 1.0).0;
        assert!(trained < initial, "loss went from {initial} to {trained}");
    }
}
