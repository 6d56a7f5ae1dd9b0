use super::{CrossEntropy, Quadratic};
use crate::arch::activations::ActFn;

/// The cost functions a network can be trained with.
///
/// Every variant has a stable code that identifies it inside persisted network files.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LossFn {
    Quadratic(Quadratic),
    CrossEntropy(CrossEntropy),
}

impl LossFn {
    pub fn quadratic() -> Self {
        Self::Quadratic(Quadratic::new())
    }

    pub fn cross_entropy() -> Self {
        Self::CrossEntropy(CrossEntropy::new())
    }

    /// The cost of a single output neuron.
    ///
    /// # Arguments
    /// * `y` - The expected activation.
    /// * `a` - The actual activation.
    pub fn cost(&self, y: f64, a: f64) -> f64 {
        match self {
            Self::Quadratic(l) => l.cost(y, a),
            Self::CrossEntropy(l) => l.cost(y, a),
        }
    }

    /// The partial derivative `∂C/∂a` of a single output neuron.
    ///
    /// # Arguments
    /// * `y` - The expected activation.
    /// * `a` - The actual activation.
    pub fn derivative(&self, y: f64, a: f64) -> f64 {
        match self {
            Self::Quadratic(l) => l.derivative(y, a),
            Self::CrossEntropy(l) => l.derivative(y, a),
        }
    }

    /// Whether this cost function is well defined on the outputs of `act_fn`.
    pub fn supports(&self, act_fn: &ActFn) -> bool {
        match self {
            Self::Quadratic(_) => true,
            Self::CrossEntropy(_) => matches!(act_fn, ActFn::Sigmoid(_)),
        }
    }

    /// The code this cost function is saved as.
    pub fn code(&self) -> u8 {
        match self {
            Self::Quadratic(_) => 0,
            Self::CrossEntropy(_) => 1,
        }
    }

    /// Looks up the cost function registered with `code`.
    ///
    /// # Returns
    /// `None` if no cost function uses that code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::quadratic()),
            1 => Some(Self::cross_entropy()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Quadratic(_) => "quadratic",
            Self::CrossEntropy(_) => "cross-entropy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_derivative_is_the_difference() {
        let loss = LossFn::quadratic();
        assert_eq!(loss.derivative(1., 0.25), -0.75);
        assert_eq!(loss.derivative(0., 0.25), 0.25);
        assert_eq!(loss.cost(1., 0.5), 0.125);
    }

    #[test]
    fn cross_entropy_cancels_the_sigmoid_derivative() {
        let loss = LossFn::cross_entropy();
        let act_fn = ActFn::sigmoid();

        for z in [-3.0, -0.5, 0.0, 0.7, 2.5] {
            for y in [0.0, 1.0, 0.3] {
                let a = act_fn.f(z);
                let error = act_fn.df(z) * loss.derivative(y, a);
                assert!((error - (a - y)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn cross_entropy_is_not_finite_on_saturated_outputs() {
        let loss = LossFn::cross_entropy();
        assert!(!loss.derivative(0., 1.).is_finite());
        assert!(!loss.derivative(1., 0.).is_finite());
    }

    #[test]
    fn cross_entropy_only_supports_sigmoid() {
        assert!(LossFn::cross_entropy().supports(&ActFn::sigmoid()));
        assert!(!LossFn::cross_entropy().supports(&ActFn::tanh()));
        assert!(LossFn::quadratic().supports(&ActFn::tanh()));
    }

    #[test]
    fn codes_round_trip() {
        for loss in [LossFn::quadratic(), LossFn::cross_entropy()] {
            assert_eq!(LossFn::from_code(loss.code()), Some(loss));
        }

        assert_eq!(LossFn::from_code(7), None);
    }
}
