use std::{f64::consts::PI, path::Path};

use chrono::{DateTime, Duration, Local, Timelike, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use relief_data::{city::CITY_TEMPLATES, Resource, ResourceMap, SyntheticRecord};
use tracing::{error, info, warn};

use crate::{
    model::{generator_network, NOISE_DIM, OUTPUTS_PER_CITY, OUTPUT_DIM},
    network::{NetworkError, Sequential},
    weights,
};

pub const POPULATION_SCALE: f64 = 50_000.0;
pub const ROAD_BLOCK_SCALE: f64 = 5.0;
pub const SEVERITY_SCALE: f64 = 100.0;
pub const GAN_NOISE_WEIGHT: f64 = 0.2;

const STOCK_FACTOR: (f64, f64) = (0.5, 1.5);
const STOCK_FACTOR_CLAMP: (f64, f64) = (0.3, 2.0);
const NEED_FACTOR: (f64, f64) = (0.8, 2.0);
const NEED_FACTOR_CLAMP: (f64, f64) = (0.5, 2.5);

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("inference failed: {0}")]
    Network(#[from] NetworkError),
    #[error("expected {expected} network outputs, got {actual}")]
    OutputWidth { expected: usize, actual: usize },
}

/// Daily population swing, peaking at 06:00 and bottoming out at 18:00.
pub fn time_factor(hour: u32) -> f64 {
    1.0 + 0.2 * (f64::from(hour) * PI / 12.0).sin()
}

fn resource_levels(base: &relief_data::city::ResourceLevels, factor: (f64, f64), clamp: (f64, f64), gan_noise: f64, rng: &mut impl Rng) -> ResourceMap {
    Resource::ALL
        .iter()
        .map(|resource| {
            let scale = (rng.gen_range(factor.0..factor.1) + GAN_NOISE_WEIGHT * gan_noise).clamp(clamp.0, clamp.1);
            (*resource, base.get(*resource) * scale)
        })
        .collect()
}

/// Maps one 15-wide generator output onto the five city records.
pub fn synthesize(output: &[f32], hour: u32, timestamp: DateTime<Utc>, rng: &mut impl Rng) -> Result<Vec<SyntheticRecord>, GenerationError> {
    if output.len() != OUTPUT_DIM {
        return Err(GenerationError::OutputWidth { expected: OUTPUT_DIM, actual: output.len() });
    }
    if output.iter().any(|v| !v.is_finite()) {
        return Err(NetworkError::NonFinite.into());
    }

    let time_factor = time_factor(hour);
    let records = CITY_TEMPLATES
        .iter()
        .zip(output.chunks_exact(OUTPUTS_PER_CITY))
        .enumerate()
        .map(|(idx, (city, chunk))| {
            let (population_noise, road_noise, severity_noise) = (f64::from(chunk[0]), f64::from(chunk[1]), f64::from(chunk[2]));
            SyntheticRecord {
                region_id: idx as u8,
                region_name: city.name.to_string(),
                population_density: (population_noise * POPULATION_SCALE * time_factor).abs() as u64 + city.base_population,
                road_block_status: (road_noise * ROAD_BLOCK_SCALE).abs() as u32,
                severity_score: (severity_noise * SEVERITY_SCALE).abs().clamp(0.0, 100.0),
                warehouse_stock_status: resource_levels(&city.base_resources, STOCK_FACTOR, STOCK_FACTOR_CLAMP, severity_noise, rng),
                resource_needs: resource_levels(&city.base_resources, NEED_FACTOR, NEED_FACTOR_CLAMP, severity_noise, rng),
                timestamp,
            }
        })
        .collect();
    Ok(records)
}

pub struct SyntheticGenerator<R = StdRng> {
    network: Sequential,
    rng: R,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SyntheticGenerator<StdRng> {
    pub fn new(network: Sequential) -> SyntheticGenerator<StdRng> {
        SyntheticGenerator::with_rng(network, StdRng::from_entropy())
    }

    /// Uses trained weights from `path` when present, otherwise a fresh network.
    pub fn load_or_init(path: impl AsRef<Path>) -> SyntheticGenerator<StdRng> {
        let path = path.as_ref();
        let mut rng = StdRng::from_entropy();
        let fresh = generator_network(&mut rng);
        let network = if path.exists() {
            match weights::load_matching(path, &fresh) {
                Ok(network) => {
                    info!(path = %path.display(), "loaded generator weights");
                    network
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not load generator weights, using untrained network");
                    fresh
                }
            }
        } else {
            info!(path = %path.display(), "no generator weights found, using untrained network");
            fresh
        };
        SyntheticGenerator::with_rng(network, rng)
    }
}

impl<R: Rng> SyntheticGenerator<R> {
    pub fn with_rng(network: Sequential, rng: R) -> SyntheticGenerator<R> {
        SyntheticGenerator { network, rng, last_timestamp: None }
    }

    pub fn network(&self) -> &Sequential {
        &self.network
    }

    /// Batch timestamps strictly increase even if the clock has not moved.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    pub fn try_generate(&mut self) -> Result<Vec<SyntheticRecord>, GenerationError> {
        let noise = (0..NOISE_DIM).map(|_| self.rng.sample::<f32, _>(StandardNormal)).collect::<Vec<_>>();
        let output = self.network.predict(&noise)?;
        let hour = Local::now().hour();
        let timestamp = self.next_timestamp();
        synthesize(&output, hour, timestamp, &mut self.rng)
    }

    /// One batch per city, or an empty vec when generation fails this tick.
    pub fn generate(&mut self) -> Vec<SyntheticRecord> {
        match self.try_generate() {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "generation error");
                Vec::new()
            }
        }
    }
}
