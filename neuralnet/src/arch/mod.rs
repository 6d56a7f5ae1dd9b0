pub mod activations;
mod backprop;
mod classifiable;
mod composite;
pub mod loss;
mod network;
mod persistence;

pub use backprop::{Gradient, backprop};
pub use classifiable::{Classifiable, LabeledSample, argmax};
pub use composite::CompositeClassifier;
pub use network::Network;
pub use persistence::VERSION as FILE_VERSION;
