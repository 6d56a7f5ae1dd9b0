use super::{Sigmoid, Tanh};

/// The activation functions a network can be built with.
///
/// Every variant has a stable code that identifies it inside persisted network files.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActFn {
    Sigmoid(Sigmoid),
    Tanh(Tanh),
}

impl ActFn {
    pub fn sigmoid() -> Self {
        Self::Sigmoid(Sigmoid::new())
    }

    pub fn tanh() -> Self {
        Self::Tanh(Tanh::new())
    }

    /// Maps a weighted sum to an activation.
    pub fn f(&self, z: f64) -> f64 {
        match self {
            Self::Sigmoid(a) => a.f(z),
            Self::Tanh(a) => a.f(z),
        }
    }

    /// The derivative of `f` evaluated at `z`.
    pub fn df(&self, z: f64) -> f64 {
        match self {
            Self::Sigmoid(a) => a.df(z),
            Self::Tanh(a) => a.df(z),
        }
    }

    /// The code this activation function is saved as.
    pub fn code(&self) -> u8 {
        match self {
            Self::Sigmoid(_) => 0,
            Self::Tanh(_) => 1,
        }
    }

    /// Looks up the activation function registered with `code`.
    ///
    /// # Returns
    /// `None` if no activation function uses that code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::sigmoid()),
            1 => Some(Self::tanh()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sigmoid(_) => "sigmoid",
            Self::Tanh(_) => "tanh",
        }
    }
}
