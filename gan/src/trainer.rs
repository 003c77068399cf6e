use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::info;

use crate::{
    model::{GanModel, NOISE_DIM, OUTPUT_DIM},
    network::{Batch, NetworkError, Sequential},
    optimizer::{binary_cross_entropy, Adam},
    weights::{self, WeightsError},
};

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub samples: usize,
    pub learning_rate: f32,
    pub beta1: f32,
    pub log_every: usize,
    /// Stop after this many epochs without a generator-loss improvement.
    pub early_stopping_patience: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            epochs: 100,
            batch_size: 32,
            samples: 10_000,
            learning_rate: 0.0002,
            beta1: 0.5,
            log_every: 10,
            early_stopping_patience: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingData {
    pub inputs: Batch,
    pub targets: Batch,
}

fn sample_rows(rows: usize, width: usize, mean: f32, std_dev: f32, rng: &mut impl Rng) -> Batch {
    (0..rows)
        .map(|_| (0..width).map(|_| mean + std_dev * rng.sample::<f32, _>(StandardNormal)).collect())
        .collect()
}

/// Two clusters of noise inputs paired with two clusters of targets.
pub fn synthetic_training_data(samples: usize, rng: &mut impl Rng) -> TrainingData {
    let half = samples / 2;
    let mut inputs = sample_rows(half, NOISE_DIM, 0.0, 1.0, rng);
    inputs.extend(sample_rows(samples - half, NOISE_DIM, 3.0, 0.5, rng));
    let mut targets = sample_rows(half, OUTPUT_DIM, 0.0, 1.0, rng);
    targets.extend(sample_rows(samples - half, OUTPUT_DIM, 2.0, 0.7, rng));
    TrainingData { inputs, targets }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochLosses {
    pub epoch: usize,
    pub discriminator: f32,
    pub generator: f32,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub history: Vec<EpochLosses>,
    pub best_generator_loss: f32,
    pub stopped_early: bool,
}

pub struct Trainer {
    pub model: GanModel,
    config: TrainerConfig,
    discriminator_optimizer: Adam,
    combined_optimizer: Adam,
    rng: StdRng,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Trainer {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let model = GanModel::new(&mut rng);
        Trainer {
            model,
            discriminator_optimizer: Adam::new(config.learning_rate, config.beta1),
            combined_optimizer: Adam::new(config.learning_rate, config.beta1),
            config,
            rng,
        }
    }

    pub fn training_data(&mut self) -> TrainingData {
        synthetic_training_data(self.config.samples, &mut self.rng)
    }

    fn discriminator_step(&mut self, batch: &Batch, label: f32) -> Result<f32, NetworkError> {
        let predictions = self.model.discriminator.forward_train(batch, &mut self.rng)?;
        let (loss, grad) = binary_cross_entropy(&predictions, label);
        self.model.discriminator.backward(&grad);
        self.discriminator_optimizer.step(&mut self.model.discriminator);
        Ok(loss)
    }

    /// Generator update through a frozen discriminator, targeting "real".
    fn combined_step(&mut self, noise: &Batch) -> Result<f32, NetworkError> {
        let generated = self.model.generator.forward_train(noise, &mut self.rng)?;
        let verdict = self.model.discriminator.forward_train(&generated, &mut self.rng)?;
        let (loss, grad) = binary_cross_entropy(&verdict, 1.0);
        let grad_generated = self.model.discriminator.backward(&grad);
        self.model.discriminator.zero_grad();
        self.model.generator.backward(&grad_generated);
        self.combined_optimizer.step(&mut self.model.generator);
        Ok(loss)
    }

    pub fn train_epoch(&mut self, epoch: usize, data: &TrainingData) -> Result<EpochLosses, NetworkError> {
        if data.inputs.is_empty() {
            return Err(NetworkError::EmptyBatch);
        }
        let indices = (0..self.config.batch_size).map(|_| self.rng.gen_range(0..data.inputs.len())).collect::<Vec<_>>();
        let real = indices.iter().map(|i| data.targets[*i].clone()).collect::<Batch>();
        let noise = indices.iter().map(|i| data.inputs[*i].clone()).collect::<Batch>();

        let fake = self.model.generator.predict_batch(&noise)?;
        let real_loss = self.discriminator_step(&real, 1.0)?;
        let fake_loss = self.discriminator_step(&fake, 0.0)?;
        let generator_loss = self.combined_step(&noise)?;

        Ok(EpochLosses {
            epoch,
            discriminator: 0.5 * (real_loss + fake_loss),
            generator: generator_loss,
        })
    }

    /// Runs all epochs, then restores the weights with the lowest generator loss.
    pub fn run(&mut self, data: &TrainingData) -> Result<TrainingReport, NetworkError> {
        let mut history = Vec::with_capacity(self.config.epochs);
        let mut best: Option<(f32, Sequential, Sequential)> = None;
        let mut epochs_without_improvement = 0;
        let mut stopped_early = false;

        for epoch in 0..self.config.epochs {
            let losses = self.train_epoch(epoch, data)?;
            if self.config.log_every > 0 && epoch % self.config.log_every == 0 {
                info!("Epoch {epoch} | D Loss: {:.4} | G Loss: {:.4}", losses.discriminator, losses.generator);
            }
            history.push(losses);

            let improved = best.as_ref().map_or(true, |(loss, _, _)| losses.generator < *loss);
            if improved {
                best = Some((losses.generator, self.model.generator.clone(), self.model.discriminator.clone()));
                epochs_without_improvement = 0;
            } else {
                epochs_without_improvement += 1;
            }
            if let Some(patience) = self.config.early_stopping_patience {
                if epochs_without_improvement >= patience {
                    info!(epoch, patience, "generator loss plateaued, stopping early");
                    stopped_early = true;
                    break;
                }
            }
        }

        let best_generator_loss = match best {
            Some((loss, generator, discriminator)) => {
                self.model.generator = generator;
                self.model.discriminator = discriminator;
                loss
            }
            None => f32::NAN,
        };
        Ok(TrainingReport { history, best_generator_loss, stopped_early })
    }

    pub fn save(&self, generator_path: impl AsRef<Path>, discriminator_path: impl AsRef<Path>) -> Result<(), WeightsError> {
        weights::save(&self.model.generator, generator_path)?;
        weights::save(&self.model.discriminator, discriminator_path)?;
        Ok(())
    }
}
