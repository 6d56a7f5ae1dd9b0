use std::{num::NonZeroUsize, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// Every knob of a training run.
///
/// The optimizer variants are all driven by this one value: momentum, dropout, the learning rate
/// schedule and best-epoch checkpointing are switched on by setting their fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrainingConfig {
    pub batch_size: usize,
    pub learning_rate: f64,
    /// The L2 regularization strength `λ`.
    #[serde(default)]
    pub regularization: f64,
    /// The amount of epochs to train for, ignored when a schedule is set.
    #[serde(default)]
    pub epochs: usize,
    /// The momentum coefficient `μ`.
    #[serde(default)]
    pub momentum: Option<f64>,
    /// The probability of keeping a hidden neuron.
    #[serde(default)]
    pub dropout: Option<f64>,
    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,
    #[serde(default)]
    pub checkpoint: Option<CheckpointConfig>,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Computes the gradients of the samples of a mini-batch in parallel.
    #[serde(default)]
    pub parallel: bool,
}

/// Trains at a fixed learning rate until the evaluation accuracy stops improving, then rescales it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleConfig {
    /// The amount of consecutive epochs without improvement that end a cycle.
    pub stall_epochs: usize,
    /// The factor the learning rate is multiplied by at the end of every cycle.
    pub rate_factor: f64,
    pub cycles: usize,
}

/// Snapshots the most accurate epoch and ends the run with it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckpointConfig {
    /// Where to copy the best snapshot to, if anywhere.
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// The directory the run's scratch directory is created in, the system's temporary
    /// directory if unset.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl TrainingConfig {
    /// Creates a new plain mini-batch gradient descent `TrainingConfig`.
    ///
    /// # Arguments
    /// * `batch_size` - The maximum amount of samples per mini-batch.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `epochs` - The amount of passes over the training set.
    pub fn new(batch_size: usize, learning_rate: f64, epochs: usize) -> Self {
        Self {
            batch_size,
            learning_rate,
            regularization: 0.,
            epochs,
            momentum: None,
            dropout: None,
            schedule: None,
            checkpoint: None,
            seed: None,
            parallel: false,
        }
    }

    /// Parses a `TrainingConfig` out of its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = Some(momentum);
        self
    }

    pub fn with_dropout(mut self, keep_probability: f64) -> Self {
        self.dropout = Some(keep_probability);
        self
    }

    pub fn with_schedule(mut self, stall_epochs: usize, rate_factor: f64, cycles: usize) -> Self {
        self.schedule = Some(ScheduleConfig {
            stall_epochs,
            rate_factor,
            cycles,
        });
        self
    }

    pub fn with_checkpoint(mut self, destination: Option<PathBuf>) -> Self {
        self.checkpoint
            .get_or_insert_with(CheckpointConfig::default)
            .destination = destination;
        self
    }

    /// Enables checkpointing with its scratch directory created inside `dir`.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.checkpoint
            .get_or_insert_with(CheckpointConfig::default)
            .scratch_dir = Some(dir);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether the run needs evaluation data to pick learning rates or snapshots.
    pub fn needs_evaluation(&self) -> bool {
        self.schedule.is_some() || self.checkpoint.is_some()
    }

    /// The batch size, or an `InvalidHyperparameter` error if it's zero.
    pub fn checked_batch_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.batch_size).ok_or(MlErr::InvalidHyperparameter {
            name: "batch_size",
            value: 0.,
        })
    }

    /// Checks every hyperparameter against its domain.
    ///
    /// # Returns
    /// An `InvalidHyperparameter` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name, value| Err(MlErr::InvalidHyperparameter { name, value });

        self.checked_batch_size()?;

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.) {
            return invalid("learning_rate", self.learning_rate);
        }

        if !(self.regularization.is_finite() && self.regularization >= 0.) {
            return invalid("regularization", self.regularization);
        }

        if let Some(mu) = self.momentum
            && !(0. ..1.).contains(&mu)
        {
            return invalid("momentum", mu);
        }

        if let Some(p) = self.dropout
            && !(p > 0. && p <= 1.)
        {
            return invalid("dropout", p);
        }

        match self.schedule {
            None if self.epochs == 0 => invalid("epochs", 0.),
            Some(ScheduleConfig { stall_epochs: 0, .. }) => invalid("stall_epochs", 0.),
            Some(ScheduleConfig { cycles: 0, .. }) => invalid("cycles", 0.),
            Some(ScheduleConfig { rate_factor, .. })
                if !(rate_factor.is_finite() && rate_factor > 0.) =>
            {
                invalid("rate_factor", rate_factor)
            }
            _ => Ok(()),
        }
    }
}
