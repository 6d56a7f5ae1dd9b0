use std::num::NonZeroUsize;

use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use super::{
    BatchOrder, CheckpointConfig, Checkpoints, DropoutMask, EpochReport, Evaluation, LearningRateSchedule,
    ScheduleStep, TrainingConfig, TrainingReport,
};
use crate::{
    MlErr, Result,
    arch::{Classifiable, Gradient, Network, backprop},
    optimization::{GradientDescent, GradientDescentWithMomentum, Optimizer},
};

/// Trains networks with mini-batch stochastic gradient descent.
///
/// Every optimizer variant runs through the same loop, `TrainingConfig` picks which of momentum,
/// dropout, the learning rate schedule and best-epoch checkpointing are enabled.
#[derive(Debug)]
pub struct Trainer {
    config: TrainingConfig,
    batch_size: NonZeroUsize,
    rng: StdRng,
}

impl Trainer {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `config` - The configuration of every run of this trainer.
    ///
    /// # Returns
    /// A new `Trainer` or an error if any hyperparameter is out of its domain.
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;

        let batch_size = config.checked_batch_size()?;
        let rng = generate_rng(config.seed);

        Ok(Self {
            config,
            batch_size,
            rng,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Trains `net` in place.
    ///
    /// Every epoch visits the training set in a new random order, split into mini-batches. The
    /// gradients of the samples of a mini-batch are averaged and applied in a single update.
    /// Samples that don't fit the network are skipped and left out of the average.
    ///
    /// With a schedule, epochs run until the evaluation accuracy stalls, then the learning rate is
    /// rescaled and a new cycle begins. With checkpointing, every epoch that beats all earlier ones
    /// is snapshotted and the run ends with that snapshot loaded into `net`. The scratch directory
    /// is removed whether the run succeeds or not.
    ///
    /// # Arguments
    /// * `net` - The network to train.
    /// * `training` - The training set.
    /// * `evaluation` - The held-out set used to measure accuracy after every epoch.
    ///
    /// # Returns
    /// The history of the run or an error if the configuration needs evaluation data and none was
    /// given, or if a snapshot couldn't be saved or restored.
    pub fn train<S>(
        &mut self,
        net: &mut Network,
        training: &[S],
        evaluation: Option<&[S]>,
    ) -> Result<TrainingReport>
    where
        S: Classifiable + Sync,
    {
        if self.config.needs_evaluation() && evaluation.is_none() {
            return Err(MlErr::MissingEvaluationData);
        }

        let mut optimizer = self.build_optimizer(net, training.len());
        let mut checkpoints = match &self.config.checkpoint {
            Some(CheckpointConfig {
                scratch_dir: Some(dir),
                ..
            }) => Some(Checkpoints::new_in(dir)?),
            Some(_) => Some(Checkpoints::new()?),
            None => None,
        };

        let baseline = evaluation.map(|samples| evaluate(net, samples));
        if let Some(baseline) = baseline {
            info!(
                correct = baseline.correct,
                total = baseline.total;
                "evaluated untrained network"
            );
        }

        let mut report = TrainingReport::new(baseline);
        let mut schedule = self.config.schedule.map(LearningRateSchedule::new);
        let mut epoch = 1;

        loop {
            let cycle = schedule.as_ref().map_or(1, LearningRateSchedule::cycle);
            let epoch_report =
                self.run_epoch(net, optimizer.as_mut(), training, evaluation, cycle, epoch)?;

            let correct = epoch_report.evaluation.map(|e| e.correct);
            report.push(epoch_report);

            let index = report.epochs().len() - 1;
            if let Some(checkpoints) = checkpoints.as_mut()
                && report.best_index() == Some(index)
            {
                checkpoints.save(index, net)?;
            }

            let Some(schedule) = schedule.as_mut() else {
                if epoch == self.config.epochs {
                    break;
                }

                epoch += 1;
                continue;
            };

            match schedule.record(correct.unwrap_or_default(), optimizer.learning_rate()) {
                ScheduleStep::Continue => epoch += 1,
                ScheduleStep::NextCycle { learning_rate } => {
                    info!(
                        cycle = schedule.cycle(),
                        learning_rate = learning_rate;
                        "accuracy stalled, starting next cycle"
                    );
                    optimizer.set_learning_rate(learning_rate);
                    epoch = 1;
                }
                ScheduleStep::Finished => break,
            }
        }

        if let Some(best) = report.best() {
            info!(
                cycle = best.cycle,
                epoch = best.epoch,
                correct = best.evaluation.map_or(0, |e| e.correct);
                "training finished"
            );
        }

        if let Some(checkpoints) = checkpoints
            && let Some(best) = checkpoints.best()
        {
            checkpoints.restore(net)?;
            debug!(index = best; "restored best checkpoint");

            let destination = self
                .config
                .checkpoint
                .as_ref()
                .and_then(|checkpoint| checkpoint.destination.as_deref());

            if let Some(destination) = destination {
                checkpoints.persist(destination)?;
                info!(destination:? = destination; "saved best network");
            }
        }

        Ok(report)
    }

    fn build_optimizer(&self, net: &Network, training_len: usize) -> Box<dyn Optimizer> {
        let lr = self.config.learning_rate;
        let weight_decay = match training_len {
            0 => 0.,
            n => self.config.regularization / n as f64,
        };

        match self.config.momentum {
            Some(mu) => Box::new(GradientDescentWithMomentum::new(net, lr, weight_decay, mu)),
            None => Box::new(GradientDescent::new(lr, weight_decay)),
        }
    }

    fn run_epoch<S>(
        &mut self,
        net: &mut Network,
        optimizer: &mut dyn Optimizer,
        training: &[S],
        evaluation: Option<&[S]>,
        cycle: usize,
        epoch: usize,
    ) -> Result<EpochReport>
    where
        S: Classifiable + Sync,
    {
        let order = BatchOrder::shuffled(training.len(), &mut self.rng);
        let mut total_cost = 0.;
        let mut trained = 0;
        let mut skipped = 0;

        for batch in order.batches(self.batch_size) {
            let mut samples = Vec::with_capacity(batch.len());

            for &i in batch {
                let sample = &training[i];

                if fits(net, sample) {
                    samples.push(sample);
                } else {
                    warn!(index = i; "skipping training sample with mismatched dimensions");
                    skipped += 1;
                }
            }

            if samples.is_empty() {
                continue;
            }

            let masks = self.config.dropout.map(|keep| {
                samples
                    .iter()
                    .map(|_| DropoutMask::sample(net.topology(), keep, &mut self.rng))
                    .collect::<Vec<_>>()
            });

            let (mut grad, cost) = if self.config.parallel {
                accumulate_parallel(net, &samples, masks.as_deref())?
            } else {
                accumulate(net, &samples, masks.as_deref())?
            };

            grad.scale(1. / samples.len() as f64);
            optimizer.update_params(&grad, net)?;

            total_cost += cost;
            trained += samples.len();
        }

        let loss = match trained {
            0 => 0.,
            n => total_cost / n as f64,
        };

        let evaluation = evaluation.map(|samples| evaluate(net, samples));
        let learning_rate = optimizer.learning_rate();

        match evaluation {
            Some(Evaluation { correct, total }) => info!(
                cycle = cycle,
                epoch = epoch,
                learning_rate = learning_rate,
                loss = loss,
                correct = correct,
                total = total;
                "finished epoch"
            ),
            None => info!(
                cycle = cycle,
                epoch = epoch,
                learning_rate = learning_rate,
                loss = loss;
                "finished epoch"
            ),
        }

        Ok(EpochReport {
            cycle,
            epoch,
            learning_rate,
            loss,
            skipped,
            evaluation,
        })
    }
}

/// Sums the gradients and costs of `samples` one after the other.
fn accumulate<S: Classifiable>(
    net: &Network,
    samples: &[&S],
    masks: Option<&[DropoutMask]>,
) -> Result<(Gradient, f64)> {
    let mut grad = Gradient::zeros(net);
    let mut cost = 0.;

    for (i, sample) in samples.iter().enumerate() {
        let mask = masks.map(|masks| &masks[i]);
        cost += backprop(net, *sample, mask, &mut grad)?;
    }

    Ok((grad, cost))
}

/// Sums the gradients and costs of `samples` with every rayon job writing into its own buffer.
fn accumulate_parallel<S: Classifiable + Sync>(
    net: &Network,
    samples: &[&S],
    masks: Option<&[DropoutMask]>,
) -> Result<(Gradient, f64)> {
    (0..samples.len())
        .into_par_iter()
        .try_fold(
            || (Gradient::zeros(net), 0.),
            |(mut grad, cost), i| -> Result<(Gradient, f64)> {
                let mask = masks.map(|masks| &masks[i]);
                let sample_cost = backprop(net, samples[i], mask, &mut grad)?;
                Ok((grad, cost + sample_cost))
            },
        )
        .try_reduce(
            || (Gradient::zeros(net), 0.),
            |(mut grad, cost), (other, other_cost)| {
                grad += &other;
                Ok((grad, cost + other_cost))
            },
        )
}

fn fits<S: Classifiable>(net: &Network, sample: &S) -> bool {
    net.check_input(sample.input().len()).is_ok()
        && net.check_output(sample.expected_output().len()).is_ok()
}

/// Classifies every sample that fits the network, skipping the rest.
fn evaluate<S: Classifiable>(net: &Network, samples: &[S]) -> Evaluation {
    let mut correct = 0;
    let mut total = 0;

    for (i, sample) in samples.iter().enumerate() {
        if !fits(net, sample) {
            warn!(index = i; "skipping evaluation sample with mismatched dimensions");
            continue;
        }

        match net.classify(sample) {
            Ok(label) if label == sample.label() => correct += 1,
            Ok(_) => {}
            Err(e) => {
                warn!(index = i; "skipping evaluation sample: {e}");
                continue;
            }
        }

        total += 1;
    }

    Evaluation { correct, total }
}

fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
