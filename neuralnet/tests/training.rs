use ndarray::{Array1, Array2, array};
use neuralnet::{
    LabeledSample, MlErr, Network, Trainer, TrainingConfig,
    arch::{activations::ActFn, loss::LossFn},
};
use rand::{SeedableRng, rngs::StdRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_net(topology: &[usize], seed: u64) -> Network {
    let mut rng = StdRng::seed_from_u64(seed);
    Network::random(topology, ActFn::sigmoid(), LossFn::quadratic(), &mut rng).unwrap()
}

fn assert_params_close(a: &Network, b: &Network, tolerance: f64) {
    for ((wa, ba), (wb, bb)) in a.params().zip(b.params()) {
        for (x, y) in wa.iter().zip(wb).chain(ba.iter().zip(bb)) {
            assert!((x - y).abs() <= tolerance, "{x} != {y}");
        }
    }
}

/// Four clusters around the corners of the unit square, labeled by quadrant.
fn quadrants(n: usize, seed: u64) -> Vec<LabeledSample> {
    use rand::Rng;

    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let class = i % 4;
            let (cx, cy) = [(0., 0.), (0., 1.), (1., 0.), (1., 1.)][class];
            let x = cx + rng.random_range(-0.2..0.2);
            let y = cy + rng.random_range(-0.2..0.2);
            LabeledSample::new(array![x, y], class, 4)
        })
        .collect()
}

#[test]
fn single_sample_step_is_minus_eta_times_the_gradient() {
    init_logger();

    let initial = random_net(&[4, 3, 2], 17);
    let x = array![0.2, -0.4, 0.9, 0.1];
    let y = array![0., 1.];
    let sample = LabeledSample::new(x.clone(), 1, 2);
    let eta = 0.5;

    let sigmoid = |z: f64| 1. / (1. + (-z).exp());
    let d_sigmoid = |z: f64| sigmoid(z) * (1. - sigmoid(z));

    // Forward pass keeping every weighted sum.
    let (w1, b1) = (initial.weights(1), initial.biases(1));
    let (w2, b2) = (initial.weights(2), initial.biases(2));
    let z1 = Array1::from_shape_fn(3, |j| (0..4).map(|m| w1[(j, m)] * x[m]).sum::<f64>() + b1[j]);
    let a1 = z1.mapv(sigmoid);
    let z2 = Array1::from_shape_fn(2, |j| (0..3).map(|m| w2[(j, m)] * a1[m]).sum::<f64>() + b2[j]);
    let a2 = z2.mapv(sigmoid);

    // Errors of the output and hidden layers.
    let e2 = Array1::from_shape_fn(2, |j| d_sigmoid(z2[j]) * (a2[j] - y[j]));
    let e1 = Array1::from_shape_fn(3, |j| {
        d_sigmoid(z1[j]) * (0..2).map(|m| e2[m] * w2[(m, j)]).sum::<f64>()
    });

    let expected_w1 = Array2::from_shape_fn((3, 4), |(j, m)| w1[(j, m)] - eta * e1[j] * x[m]);
    let expected_w2 = Array2::from_shape_fn((2, 3), |(j, m)| w2[(j, m)] - eta * e2[j] * a1[m]);
    let expected_b1 = Array1::from_shape_fn(3, |j| b1[j] - eta * e1[j]);
    let expected_b2 = Array1::from_shape_fn(2, |j| b2[j] - eta * e2[j]);
    let expected = Network::from_params(
        vec![expected_w1, expected_w2],
        vec![expected_b1, expected_b2],
        ActFn::sigmoid(),
        LossFn::quadratic(),
    )
    .unwrap();

    let mut net = initial.clone();
    let config = TrainingConfig::new(1, eta, 1).with_seed(0);
    Trainer::new(config)
        .unwrap()
        .train(&mut net, &[sample], None)
        .unwrap();

    assert_params_close(&net, &expected, 1e-14);
    assert_ne!(net, initial);
}

#[test]
fn identical_copies_average_to_a_single_sample() {
    init_logger();

    let sample = LabeledSample::new(array![0.3, 0.6, -0.1], 2, 3);
    let mut single = random_net(&[3, 5, 3], 2);
    let mut copies = single.clone();

    let mut trainer = Trainer::new(TrainingConfig::new(1, 0.8, 1).with_seed(1)).unwrap();
    trainer
        .train(&mut single, std::slice::from_ref(&sample), None)
        .unwrap();

    let batch = vec![sample; 5];
    let mut trainer = Trainer::new(TrainingConfig::new(5, 0.8, 1).with_seed(1)).unwrap();
    trainer.train(&mut copies, &batch, None).unwrap();

    assert_params_close(&single, &copies, 1e-12);
}

#[test]
fn regularization_decays_weights() {
    let data = quadrants(8, 5);
    let initial = random_net(&[2, 3, 4], 6);
    let (eta, lambda) = (0.5, 4.);

    let mut plain = initial.clone();
    Trainer::new(TrainingConfig::new(8, eta, 1).with_seed(9))
        .unwrap()
        .train(&mut plain, &data, None)
        .unwrap();

    let mut regularized = initial.clone();
    Trainer::new(
        TrainingConfig::new(8, eta, 1)
            .with_regularization(lambda)
            .with_seed(9),
    )
    .unwrap()
    .train(&mut regularized, &data, None)
    .unwrap();

    let shrink = eta * lambda / data.len() as f64;
    for i in 1..initial.layers() {
        let expected = &plain.weights(i) - &(&initial.weights(i) * shrink);
        for (x, y) in regularized.weights(i).iter().zip(&expected) {
            assert!((x - y).abs() < 1e-12);
        }
        assert_eq!(regularized.biases(i), plain.biases(i));
    }
}

#[test]
fn parallel_accumulation_matches_sequential() {
    init_logger();

    let data = quadrants(64, 11);
    let mut sequential = random_net(&[2, 8, 4], 12);
    let mut parallel = sequential.clone();

    let config = TrainingConfig::new(16, 1., 3)
        .with_momentum(0.5)
        .with_dropout(0.8)
        .with_seed(13);

    Trainer::new(config.clone())
        .unwrap()
        .train(&mut sequential, &data, None)
        .unwrap();
    Trainer::new(config.with_parallel(true))
        .unwrap()
        .train(&mut parallel, &data, None)
        .unwrap();

    assert_params_close(&sequential, &parallel, 1e-10);
}

#[test]
fn seeded_runs_are_reproducible() {
    let data = quadrants(32, 3);
    let config = TrainingConfig::new(4, 2., 5).with_dropout(0.5).with_seed(77);

    let mut first = random_net(&[2, 6, 4], 1);
    let mut second = first.clone();
    Trainer::new(config.clone())
        .unwrap()
        .train(&mut first, &data, None)
        .unwrap();
    Trainer::new(config)
        .unwrap()
        .train(&mut second, &data, None)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn keeping_every_neuron_matches_plain_training() {
    let data = quadrants(12, 4);
    let mut plain = random_net(&[2, 5, 4], 8);
    let mut dropout = plain.clone();

    // One batch and one epoch, so the shuffle happens before any mask is drawn.
    Trainer::new(TrainingConfig::new(12, 1., 1).with_seed(2))
        .unwrap()
        .train(&mut plain, &data, None)
        .unwrap();
    Trainer::new(TrainingConfig::new(12, 1., 1).with_dropout(1.).with_seed(2))
        .unwrap()
        .train(&mut dropout, &data, None)
        .unwrap();

    assert_eq!(plain, dropout);
}

#[test]
fn mismatched_samples_are_skipped() {
    init_logger();

    let mut data = quadrants(8, 21);
    data.insert(3, LabeledSample::new(array![1., 2., 3.], 0, 4));
    data.push(LabeledSample::new(array![1., 2.], 0, 3));

    let mut net = random_net(&[2, 4, 4], 22);
    let report = Trainer::new(TrainingConfig::new(3, 0.5, 2).with_seed(23))
        .unwrap()
        .train(&mut net, &data, Some(data.as_slice()))
        .unwrap();

    for epoch in report.epochs() {
        assert_eq!(epoch.skipped, 2);
        assert_eq!(epoch.evaluation.map(|e| e.total), Some(8));
        assert!(epoch.loss.is_finite());
    }
}

#[test]
fn batches_without_usable_samples_do_nothing() {
    let data = vec![LabeledSample::new(array![1.], 0, 4); 3];
    let initial = random_net(&[2, 3, 4], 30);
    let mut net = initial.clone();

    let report = Trainer::new(TrainingConfig::new(2, 0.5, 1).with_seed(1))
        .unwrap()
        .train(&mut net, &data, None)
        .unwrap();

    assert_eq!(net, initial);
    assert_eq!(report.epochs()[0].skipped, 3);
    assert_eq!(report.epochs()[0].loss, 0.);
}

#[test]
fn evaluation_modes_require_evaluation_data() {
    let data = quadrants(4, 1);
    let mut net = random_net(&[2, 3, 4], 1);

    for config in [
        TrainingConfig::new(2, 0.5, 3).with_schedule(2, 0.5, 2),
        TrainingConfig::new(2, 0.5, 3).with_checkpoint(None),
    ] {
        let err = Trainer::new(config)
            .unwrap()
            .train(&mut net, &data, None)
            .unwrap_err();
        assert!(matches!(err, MlErr::MissingEvaluationData));
    }
}

#[test]
fn invalid_configs_are_rejected_up_front() {
    let err = Trainer::new(TrainingConfig::new(0, 0.5, 3)).unwrap_err();
    assert!(matches!(
        err,
        MlErr::InvalidHyperparameter {
            name: "batch_size",
            ..
        }
    ));
}

#[test]
fn baseline_is_evaluated_before_training() {
    let data = quadrants(20, 40);
    let mut net = random_net(&[2, 4, 4], 41);
    let before = net.evaluate(&data).unwrap();

    let report = Trainer::new(TrainingConfig::new(5, 1., 2).with_seed(42))
        .unwrap()
        .train(&mut net, &data, Some(data.as_slice()))
        .unwrap();

    let baseline = report.baseline().unwrap();
    assert_eq!(baseline.correct, before);
    assert_eq!(baseline.total, 20);
    assert_eq!(report.epochs().len(), 2);
}

#[test]
fn scheduled_learning_rate_runs_every_cycle() {
    init_logger();

    let training = quadrants(40, 50);
    let evaluation = quadrants(20, 51);
    let mut net = random_net(&[2, 6, 4], 52);
    let eta = 2.;

    let config = TrainingConfig::new(8, eta, 0)
        .with_schedule(2, 0.5, 3)
        .with_seed(53);
    let report = Trainer::new(config)
        .unwrap()
        .train(&mut net, &training, Some(evaluation.as_slice()))
        .unwrap();

    let epochs = report.epochs();
    assert_eq!(epochs[0].cycle, 1);
    assert_eq!(epochs[epochs.len() - 1].cycle, 3);

    for epoch in epochs {
        let expected = eta * 0.5f64.powi(epoch.cycle as i32 - 1);
        assert_eq!(epoch.learning_rate, expected);
    }

    for pair in epochs.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.cycle == prev.cycle {
            assert_eq!(next.epoch, prev.epoch + 1);
        } else {
            assert_eq!(next.cycle, prev.cycle + 1);
            assert_eq!(next.epoch, 1);
        }
    }

    // Every cycle ends with at least two stalled epochs.
    for cycle in 1..=3 {
        let count = epochs.iter().filter(|e| e.cycle == cycle).count();
        assert!(count >= 3);
    }
}

#[test]
fn checkpointing_keeps_the_best_epoch() {
    init_logger();

    let training = quadrants(40, 60);
    let evaluation = quadrants(40, 61);
    let mut net = random_net(&[2, 5, 4], 62);

    let out = tempfile::tempdir().unwrap();
    let destination = out.path().join("best.net");

    // A huge learning rate makes accuracy bounce around between epochs.
    let config = TrainingConfig::new(4, 40., 8)
        .with_checkpoint(Some(destination.clone()))
        .with_seed(63);
    let report = Trainer::new(config)
        .unwrap()
        .train(&mut net, &training, Some(evaluation.as_slice()))
        .unwrap();

    let best = report.best().unwrap().evaluation.unwrap();
    for epoch in report.epochs() {
        assert!(epoch.evaluation.unwrap().correct <= best.correct);
    }

    assert_eq!(net.evaluate(&evaluation).unwrap(), best.correct);
    assert_eq!(Network::load(&destination).unwrap(), net);
}

#[test]
fn scratch_directory_is_removed_when_training_fails() {
    init_logger();

    let training = quadrants(16, 70);
    let evaluation = quadrants(16, 71);
    let mut net = random_net(&[2, 4, 4], 72);

    let scratch = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let destination = out.path().join("missing").join("best.net");

    let config = TrainingConfig::new(4, 1., 3)
        .with_checkpoint(Some(destination.clone()))
        .with_scratch_dir(scratch.path().to_path_buf())
        .with_seed(73);
    let err = Trainer::new(config)
        .unwrap()
        .train(&mut net, &training, Some(evaluation.as_slice()))
        .unwrap_err();

    assert!(matches!(err, MlErr::Io(_)));
    assert!(!destination.exists());
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn scratch_directory_is_removed_after_training() {
    init_logger();

    let training = quadrants(16, 80);
    let evaluation = quadrants(16, 81);
    let mut net = random_net(&[2, 4, 4], 82);

    let scratch = tempfile::tempdir().unwrap();
    let config = TrainingConfig::new(4, 1., 3)
        .with_scratch_dir(scratch.path().to_path_buf())
        .with_seed(83);
    let report = Trainer::new(config)
        .unwrap()
        .train(&mut net, &training, Some(evaluation.as_slice()))
        .unwrap();

    assert_eq!(report.epochs().len(), 3);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
