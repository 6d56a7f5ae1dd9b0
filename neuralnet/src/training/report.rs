use serde::Serialize;

/// The result of classifying an evaluation set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
}

impl Evaluation {
    /// The fraction of correctly classified samples, `0` for empty sets.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.;
        }

        self.correct as f64 / self.total as f64
    }
}

/// What happened during a single epoch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EpochReport {
    /// The learning rate cycle, always 1 without a schedule.
    pub cycle: usize,
    /// The epoch number within the cycle, starting at 1.
    pub epoch: usize,
    pub learning_rate: f64,
    /// The mean cost of the trained samples, measured while training.
    pub loss: f64,
    /// The amount of training samples skipped for not fitting the network.
    pub skipped: usize,
    pub evaluation: Option<Evaluation>,
}

/// The history of a training run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrainingReport {
    baseline: Option<Evaluation>,
    epochs: Vec<EpochReport>,
    best: Option<usize>,
}

impl TrainingReport {
    /// Creates an empty `TrainingReport`.
    ///
    /// # Arguments
    /// * `baseline` - The evaluation of the network before any training.
    pub fn new(baseline: Option<Evaluation>) -> Self {
        Self {
            baseline,
            epochs: Vec::new(),
            best: None,
        }
    }

    /// Appends an epoch, it becomes the best one if it's more accurate than every previous epoch.
    pub fn push(&mut self, epoch: EpochReport) {
        if let Some(Evaluation { correct, .. }) = epoch.evaluation {
            let best_correct = self.best().and_then(|best| best.evaluation).map(|e| e.correct);

            if best_correct.is_none_or(|best| correct > best) {
                self.best = Some(self.epochs.len());
            }
        }

        self.epochs.push(epoch);
    }

    pub fn baseline(&self) -> Option<Evaluation> {
        self.baseline
    }

    pub fn epochs(&self) -> &[EpochReport] {
        &self.epochs
    }

    /// The index into `epochs` of the most accurate epoch, the earliest one on ties.
    pub fn best_index(&self) -> Option<usize> {
        self.best
    }

    pub fn best(&self) -> Option<&EpochReport> {
        self.best.map(|i| &self.epochs[i])
    }

    /// The most recent epoch, if any.
    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}
