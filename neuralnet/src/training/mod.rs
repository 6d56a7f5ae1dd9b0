mod checkpoint;
mod config;
mod dataset;
mod dropout;
mod report;
mod schedule;
mod trainer;

pub use checkpoint::Checkpoints;
pub use config::{CheckpointConfig, ScheduleConfig, TrainingConfig};
pub use dataset::BatchOrder;
pub use dropout::DropoutMask;
pub use report::{EpochReport, Evaluation, TrainingReport};
pub use schedule::{LearningRateSchedule, ScheduleStep};
pub use trainer::Trainer;
