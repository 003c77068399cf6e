use rand::Rng;

use crate::network::{Activation, BatchNorm, Dense, Dropout, Layer, Sequential};

pub const NOISE_DIM: usize = 5;
pub const OUTPUT_DIM: usize = 15;
pub const OUTPUTS_PER_CITY: usize = 3;

pub const GENERATOR_WEIGHTS_PATH: &str = "gan_generator.weights";
pub const DISCRIMINATOR_WEIGHTS_PATH: &str = "gan_discriminator.weights";

/// dense(128) -> batch norm -> dense(64) -> dropout(0.2) -> dense(15, tanh)
pub fn generator_network(rng: &mut impl Rng) -> Sequential {
    Sequential::new(vec![
        Layer::Dense(Dense::new(NOISE_DIM, 128, Activation::LeakyRelu, rng)),
        Layer::BatchNorm(BatchNorm::new(128)),
        Layer::Dense(Dense::new(128, 64, Activation::LeakyRelu, rng)),
        Layer::Dropout(Dropout::new(0.2)),
        Layer::Dense(Dense::new(64, OUTPUT_DIM, Activation::Tanh, rng)),
    ])
}

pub fn discriminator_network(rng: &mut impl Rng) -> Sequential {
    Sequential::new(vec![
        Layer::Dense(Dense::new(OUTPUT_DIM, 64, Activation::LeakyRelu, rng)),
        Layer::Dense(Dense::new(64, 32, Activation::LeakyRelu, rng)),
        Layer::Dense(Dense::new(32, 1, Activation::Sigmoid, rng)),
    ])
}

#[derive(Debug, Clone)]
pub struct GanModel {
    pub generator: Sequential,
    pub discriminator: Sequential,
}

impl GanModel {
    pub fn new(rng: &mut impl Rng) -> GanModel {
        GanModel {
            generator: generator_network(rng),
            discriminator: discriminator_network(rng),
        }
    }
}
