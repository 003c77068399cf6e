use anyhow::Context;
use gan::{Trainer, TrainerConfig, DISCRIMINATOR_WEIGHTS_PATH, GENERATOR_WEIGHTS_PATH};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = TrainerConfig::default();
    info!(epochs = config.epochs, batch_size = config.batch_size, samples = config.samples, "training GAN");

    let mut trainer = Trainer::new(config);
    let data = trainer.training_data();
    let report = trainer.run(&data).context("training failed")?;
    info!(epochs_run = report.history.len(), best_g_loss = report.best_generator_loss, stopped_early = report.stopped_early, "training finished");

    trainer
        .save(GENERATOR_WEIGHTS_PATH, DISCRIMINATOR_WEIGHTS_PATH)
        .with_context(|| format!("could not write {GENERATOR_WEIGHTS_PATH} / {DISCRIMINATOR_WEIGHTS_PATH}"))?;
    info!(generator = GENERATOR_WEIGHTS_PATH, discriminator = DISCRIMINATOR_WEIGHTS_PATH, "saved weights");
    Ok(())
}
