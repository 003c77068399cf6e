use gan::{
    model::{discriminator_network, generator_network},
    weights, Trainer, TrainerConfig,
};
use rand::{rngs::StdRng, SeedableRng};

#[test]
fn saved_generator_gives_identical_inference() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gan_generator.weights");
    let network = generator_network(&mut StdRng::seed_from_u64(3));
    weights::save(&network, &path).unwrap();

    let restored = weights::load_matching(&path, &generator_network(&mut StdRng::seed_from_u64(4))).unwrap();
    for input in [[0.0; 5], [1.0, -2.0, 0.5, 3.0, -0.25]] {
        assert_eq!(restored.predict(&input).unwrap(), network.predict(&input).unwrap());
    }
}

#[test]
fn trainer_writes_both_weight_files() {
    let dir = tempfile::tempdir().unwrap();
    let gen_path = dir.path().join("gen.weights");
    let disc_path = dir.path().join("disc.weights");

    let mut trainer = Trainer::new(TrainerConfig { epochs: 5, samples: 64, seed: Some(8), ..TrainerConfig::default() });
    let data = trainer.training_data();
    let report = trainer.run(&data).unwrap();
    assert_eq!(report.history.len(), 5);
    trainer.save(&gen_path, &disc_path).unwrap();

    let mut rng = StdRng::seed_from_u64(0);
    let generator = weights::load_matching(&gen_path, &generator_network(&mut rng)).unwrap();
    let discriminator = weights::load_matching(&disc_path, &discriminator_network(&mut rng)).unwrap();
    let input = [0.3, 0.1, -0.4, 2.0, 1.0];
    assert_eq!(generator.predict(&input).unwrap(), trainer.model.generator.predict(&input).unwrap());
    assert!(discriminator.same_shape(&trainer.model.discriminator));
}
