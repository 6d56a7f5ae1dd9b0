/// Cross-entropy cost for sigmoid outputs, `-(y ln a + (1 - y) ln(1 - a))` per output neuron.
///
/// Its derivative is designed to cancel against the sigmoid's derivative, so that the output
/// error of a sigmoid network reduces to `a - y`. Outside of `(0, 1)` the values are not finite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CrossEntropy;

impl CrossEntropy {
    pub fn new() -> Self {
        Self
    }

    pub fn cost(&self, y: f64, a: f64) -> f64 {
        // 0 * ln(0) is taken as 0.
        let term = |t: f64, p: f64| if t == 0. { 0. } else { t * p.ln() };
        -(term(y, a) + term(1. - y, 1. - a))
    }

    pub fn derivative(&self, y: f64, a: f64) -> f64 {
        (1. - y) / (1. - a) - y / a
    }
}
