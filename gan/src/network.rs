//! A minimal feed-forward network with just enough backprop for the
//! adversarial trainer. Batches are plain row vectors.

use rand::Rng;

pub type Batch = Vec<Vec<f32>>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NetworkError {
    #[error("expected input width {expected}, got {actual}")]
    InputWidth { expected: usize, actual: usize },
    #[error("network produced a non-finite value")]
    NonFinite,
    #[error("empty batch")]
    EmptyBatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Linear,
    LeakyRelu,
    Tanh,
    Sigmoid,
}

impl Activation {
    pub const LEAKY_SLOPE: f32 = 0.2;

    pub fn apply(&self, z: f32) -> f32 {
        match self {
            Activation::Linear => z,
            Activation::LeakyRelu => if z > 0.0 { z } else { Self::LEAKY_SLOPE * z },
            Activation::Tanh => z.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-z).exp()),
        }
    }

    /// d(output)/d(z), given the pre-activation `z` and the output `y`.
    pub fn derivative(&self, z: f32, y: f32) -> f32 {
        match self {
            Activation::Linear => 1.0,
            Activation::LeakyRelu => if z > 0.0 { 1.0 } else { Self::LEAKY_SLOPE },
            Activation::Tanh => 1.0 - y * y,
            Activation::Sigmoid => y * (1.0 - y),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            Activation::Linear => 0,
            Activation::LeakyRelu => 1,
            Activation::Tanh => 2,
            Activation::Sigmoid => 3,
        }
    }

    pub fn from_u32(index: u32) -> Option<Activation> {
        match index {
            0 => Some(Activation::Linear),
            1 => Some(Activation::LeakyRelu),
            2 => Some(Activation::Tanh),
            3 => Some(Activation::Sigmoid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DenseCache {
    inputs: Batch,
    pre_activations: Batch,
    outputs: Batch,
}

#[derive(Debug, Clone)]
pub struct Dense {
    pub inputs: usize,
    pub outputs: usize,
    pub activation: Activation,
    /// Row-major, `outputs` rows of `inputs` weights.
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
    grad_weights: Vec<f32>,
    grad_bias: Vec<f32>,
    cache: DenseCache,
}

impl Dense {
    /// Glorot-uniform weights, zero bias.
    pub fn new(inputs: usize, outputs: usize, activation: Activation, rng: &mut impl Rng) -> Dense {
        let limit = (6.0 / (inputs + outputs) as f32).sqrt();
        let weights = (0..inputs * outputs).map(|_| rng.gen_range(-limit..limit)).collect();
        Dense::from_parts(inputs, outputs, activation, weights, vec![0.0; outputs])
    }

    pub fn from_parts(inputs: usize, outputs: usize, activation: Activation, weights: Vec<f32>, bias: Vec<f32>) -> Dense {
        Dense {
            inputs,
            outputs,
            activation,
            weights,
            bias,
            grad_weights: vec![0.0; inputs * outputs],
            grad_bias: vec![0.0; outputs],
            cache: DenseCache::default(),
        }
    }

    fn pre_activation(&self, x: &[f32]) -> Vec<f32> {
        (0..self.outputs)
            .map(|o| {
                let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
                self.bias[o] + row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f32>()
            })
            .collect()
    }

    fn infer(&self, x: &[f32]) -> Vec<f32> {
        self.pre_activation(x).into_iter().map(|z| self.activation.apply(z)).collect()
    }

    fn forward_train(&mut self, batch: &Batch) -> Batch {
        let pre_activations = batch.iter().map(|x| self.pre_activation(x)).collect::<Batch>();
        let outputs = pre_activations
            .iter()
            .map(|z| z.iter().map(|zi| self.activation.apply(*zi)).collect())
            .collect::<Batch>();
        self.cache = DenseCache { inputs: batch.clone(), pre_activations, outputs: outputs.clone() };
        outputs
    }

    fn backward(&mut self, grad_outputs: &Batch) -> Batch {
        let mut grad_inputs = Vec::with_capacity(grad_outputs.len());
        for (n, grad) in grad_outputs.iter().enumerate() {
            let x = &self.cache.inputs[n];
            let mut grad_x = vec![0.0; self.inputs];
            for o in 0..self.outputs {
                let dz = grad[o] * self.activation.derivative(self.cache.pre_activations[n][o], self.cache.outputs[n][o]);
                self.grad_bias[o] += dz;
                let row = o * self.inputs;
                for i in 0..self.inputs {
                    self.grad_weights[row + i] += dz * x[i];
                    grad_x[i] += dz * self.weights[row + i];
                }
            }
            grad_inputs.push(grad_x);
        }
        grad_inputs
    }
}

#[derive(Debug, Clone, Default)]
struct BatchNormCache {
    normalized: Batch,
    inv_std: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct BatchNorm {
    pub width: usize,
    pub gamma: Vec<f32>,
    pub beta: Vec<f32>,
    pub running_mean: Vec<f32>,
    pub running_var: Vec<f32>,
    grad_gamma: Vec<f32>,
    grad_beta: Vec<f32>,
    cache: BatchNormCache,
}

impl BatchNorm {
    pub const MOMENTUM: f32 = 0.99;
    pub const EPSILON: f32 = 1e-3;

    pub fn new(width: usize) -> BatchNorm {
        BatchNorm::from_parts(width, vec![1.0; width], vec![0.0; width], vec![0.0; width], vec![1.0; width])
    }

    pub fn from_parts(width: usize, gamma: Vec<f32>, beta: Vec<f32>, running_mean: Vec<f32>, running_var: Vec<f32>) -> BatchNorm {
        BatchNorm {
            width,
            gamma,
            beta,
            running_mean,
            running_var,
            grad_gamma: vec![0.0; width],
            grad_beta: vec![0.0; width],
            cache: BatchNormCache::default(),
        }
    }

    fn infer(&self, x: &[f32]) -> Vec<f32> {
        (0..self.width)
            .map(|j| {
                let normalized = (x[j] - self.running_mean[j]) / (self.running_var[j] + Self::EPSILON).sqrt();
                self.gamma[j] * normalized + self.beta[j]
            })
            .collect()
    }

    fn forward_train(&mut self, batch: &Batch) -> Batch {
        let n = batch.len() as f32;
        let mut mean = vec![0.0; self.width];
        let mut var = vec![0.0; self.width];
        for x in batch {
            for j in 0..self.width {
                mean[j] += x[j] / n;
            }
        }
        for x in batch {
            for j in 0..self.width {
                var[j] += (x[j] - mean[j]).powi(2) / n;
            }
        }
        let inv_std = var.iter().map(|v| 1.0 / (v + Self::EPSILON).sqrt()).collect::<Vec<_>>();
        let normalized = batch
            .iter()
            .map(|x| (0..self.width).map(|j| (x[j] - mean[j]) * inv_std[j]).collect::<Vec<_>>())
            .collect::<Batch>();
        for j in 0..self.width {
            self.running_mean[j] = Self::MOMENTUM * self.running_mean[j] + (1.0 - Self::MOMENTUM) * mean[j];
            self.running_var[j] = Self::MOMENTUM * self.running_var[j] + (1.0 - Self::MOMENTUM) * var[j];
        }
        let outputs = normalized
            .iter()
            .map(|xhat| (0..self.width).map(|j| self.gamma[j] * xhat[j] + self.beta[j]).collect())
            .collect();
        self.cache = BatchNormCache { normalized, inv_std };
        outputs
    }

    fn backward(&mut self, grad_outputs: &Batch) -> Batch {
        let n = grad_outputs.len() as f32;
        let mut sum_dxhat = vec![0.0; self.width];
        let mut sum_dxhat_xhat = vec![0.0; self.width];
        for (dy, xhat) in grad_outputs.iter().zip(&self.cache.normalized) {
            for j in 0..self.width {
                self.grad_gamma[j] += dy[j] * xhat[j];
                self.grad_beta[j] += dy[j];
                let dxhat = dy[j] * self.gamma[j];
                sum_dxhat[j] += dxhat;
                sum_dxhat_xhat[j] += dxhat * xhat[j];
            }
        }
        grad_outputs
            .iter()
            .zip(&self.cache.normalized)
            .map(|(dy, xhat)| {
                (0..self.width)
                    .map(|j| {
                        let dxhat = dy[j] * self.gamma[j];
                        self.cache.inv_std[j] / n * (n * dxhat - sum_dxhat[j] - xhat[j] * sum_dxhat_xhat[j])
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Dropout {
    pub rate: f32,
    mask: Batch,
}

impl Dropout {
    pub fn new(rate: f32) -> Dropout {
        Dropout { rate, mask: Vec::new() }
    }

    fn forward_train(&mut self, batch: &Batch, rng: &mut impl Rng) -> Batch {
        let keep = 1.0 - self.rate;
        self.mask = batch
            .iter()
            .map(|x| x.iter().map(|_| if rng.gen::<f32>() < keep { 1.0 / keep } else { 0.0 }).collect())
            .collect();
        batch
            .iter()
            .zip(&self.mask)
            .map(|(x, m)| x.iter().zip(m).map(|(xi, mi)| xi * mi).collect())
            .collect()
    }

    fn backward(&self, grad_outputs: &Batch) -> Batch {
        grad_outputs
            .iter()
            .zip(&self.mask)
            .map(|(g, m)| g.iter().zip(m).map(|(gi, mi)| gi * mi).collect())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum Layer {
    Dense(Dense),
    BatchNorm(BatchNorm),
    Dropout(Dropout),
}

impl Layer {
    pub fn input_width(&self) -> Option<usize> {
        match self {
            Layer::Dense(dense) => Some(dense.inputs),
            Layer::BatchNorm(norm) => Some(norm.width),
            Layer::Dropout(_) => None,
        }
    }

    /// Same kind and dimensions; parameter values are ignored.
    pub fn same_shape(&self, other: &Layer) -> bool {
        match (self, other) {
            (Layer::Dense(a), Layer::Dense(b)) => a.inputs == b.inputs && a.outputs == b.outputs && a.activation == b.activation,
            (Layer::BatchNorm(a), Layer::BatchNorm(b)) => a.width == b.width,
            (Layer::Dropout(a), Layer::Dropout(b)) => a.rate == b.rate,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sequential {
    pub layers: Vec<Layer>,
}

impl Sequential {
    pub fn new(layers: Vec<Layer>) -> Sequential {
        Sequential { layers }
    }

    pub fn input_width(&self) -> Option<usize> {
        self.layers.iter().find_map(Layer::input_width)
    }

    pub fn same_shape(&self, other: &Sequential) -> bool {
        self.layers.len() == other.layers.len() && self.layers.iter().zip(&other.layers).all(|(a, b)| a.same_shape(b))
    }

    /// Inference pass: batch norm uses running statistics and dropout is a no-op.
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>, NetworkError> {
        if let Some(expected) = self.input_width() {
            if input.len() != expected {
                return Err(NetworkError::InputWidth { expected, actual: input.len() });
            }
        }
        let mut x = input.to_vec();
        for layer in &self.layers {
            x = match layer {
                Layer::Dense(dense) => dense.infer(&x),
                Layer::BatchNorm(norm) => norm.infer(&x),
                Layer::Dropout(_) => x,
            };
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(NetworkError::NonFinite);
        }
        Ok(x)
    }

    pub fn predict_batch(&self, batch: &Batch) -> Result<Batch, NetworkError> {
        batch.iter().map(|x| self.predict(x)).collect()
    }

    /// Training pass; caches what `backward` needs.
    pub fn forward_train(&mut self, batch: &Batch, rng: &mut impl Rng) -> Result<Batch, NetworkError> {
        if batch.is_empty() {
            return Err(NetworkError::EmptyBatch);
        }
        if let Some(expected) = self.input_width() {
            if let Some(row) = batch.iter().find(|row| row.len() != expected) {
                return Err(NetworkError::InputWidth { expected, actual: row.len() });
            }
        }
        let mut x = batch.clone();
        for layer in &mut self.layers {
            x = match layer {
                Layer::Dense(dense) => dense.forward_train(&x),
                Layer::BatchNorm(norm) => norm.forward_train(&x),
                Layer::Dropout(dropout) => dropout.forward_train(&x, rng),
            };
        }
        Ok(x)
    }

    /// Accumulates parameter gradients and returns the gradient w.r.t. the input batch.
    pub fn backward(&mut self, grad_outputs: &Batch) -> Batch {
        let mut grad = grad_outputs.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = match layer {
                Layer::Dense(dense) => dense.backward(&grad),
                Layer::BatchNorm(norm) => norm.backward(&grad),
                Layer::Dropout(dropout) => dropout.backward(&grad),
            };
        }
        grad
    }

    pub fn zero_grad(&mut self) {
        for layer in &mut self.layers {
            match layer {
                Layer::Dense(dense) => {
                    dense.grad_weights.iter_mut().for_each(|g| *g = 0.0);
                    dense.grad_bias.iter_mut().for_each(|g| *g = 0.0);
                }
                Layer::BatchNorm(norm) => {
                    norm.grad_gamma.iter_mut().for_each(|g| *g = 0.0);
                    norm.grad_beta.iter_mut().for_each(|g| *g = 0.0);
                }
                Layer::Dropout(_) => {}
            }
        }
    }

    /// Trainable tensors paired with their accumulated gradients, in a stable order.
    pub fn parameters(&mut self) -> Vec<(&mut [f32], &[f32])> {
        let mut parameters = Vec::new();
        for layer in &mut self.layers {
            match layer {
                Layer::Dense(dense) => {
                    parameters.push((dense.weights.as_mut_slice(), dense.grad_weights.as_slice()));
                    parameters.push((dense.bias.as_mut_slice(), dense.grad_bias.as_slice()));
                }
                Layer::BatchNorm(norm) => {
                    parameters.push((norm.gamma.as_mut_slice(), norm.grad_gamma.as_slice()));
                    parameters.push((norm.beta.as_mut_slice(), norm.grad_beta.as_slice()));
                }
                Layer::Dropout(_) => {}
            }
        }
        parameters
    }
}
