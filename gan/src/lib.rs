pub mod generator;
pub mod model;
pub mod network;
pub mod optimizer;
pub mod trainer;
pub mod weights;

pub use generator::{GenerationError, SyntheticGenerator};
pub use model::{GanModel, DISCRIMINATOR_WEIGHTS_PATH, GENERATOR_WEIGHTS_PATH};
pub use network::{NetworkError, Sequential};
pub use trainer::{Trainer, TrainerConfig, TrainingReport};
pub use weights::WeightsError;
