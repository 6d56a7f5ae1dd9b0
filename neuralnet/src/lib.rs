pub mod arch;
pub mod error;
pub mod optimization;
pub mod training;

pub use arch::{Classifiable, CompositeClassifier, LabeledSample, Network};
pub use error::{MlErr, Result};
pub use training::{Trainer, TrainingConfig, TrainingReport};
