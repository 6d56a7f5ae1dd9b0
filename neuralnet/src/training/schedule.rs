use super::ScheduleConfig;

/// What to do after an epoch of scheduled training.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScheduleStep {
    /// Keep training at the same learning rate.
    Continue,
    /// The cycle stalled, start the next one at `learning_rate`.
    NextCycle { learning_rate: f64 },
    /// The last cycle stalled.
    Finished,
}

/// Tracks the evaluation accuracy across the cycles of a scheduled training run.
///
/// An epoch improves only if it classifies strictly more samples correctly than every other epoch
/// of the current cycle, the first epoch of a cycle always improves.
#[derive(Clone, Debug)]
pub struct LearningRateSchedule {
    config: ScheduleConfig,
    cycle: usize,
    best: Option<usize>,
    stalled: usize,
}

impl LearningRateSchedule {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            cycle: 1,
            best: None,
            stalled: 0,
        }
    }

    /// The current cycle, starting at 1.
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Records the accuracy of the epoch that just finished.
    ///
    /// # Arguments
    /// * `correct` - The amount of correctly classified evaluation samples.
    /// * `learning_rate` - The learning rate the epoch was trained with.
    ///
    /// # Returns
    /// The next step of the run.
    pub fn record(&mut self, correct: usize, learning_rate: f64) -> ScheduleStep {
        if self.best.is_none_or(|best| correct > best) {
            self.best = Some(correct);
            self.stalled = 0;
            return ScheduleStep::Continue;
        }

        self.stalled += 1;
        if self.stalled < self.config.stall_epochs {
            return ScheduleStep::Continue;
        }

        if self.cycle == self.config.cycles {
            return ScheduleStep::Finished;
        }

        self.cycle += 1;
        self.best = None;
        self.stalled = 0;

        ScheduleStep::NextCycle {
            learning_rate: learning_rate * self.config.rate_factor,
        }
    }
}
