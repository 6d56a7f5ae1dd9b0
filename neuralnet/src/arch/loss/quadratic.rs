/// Quadratic cost, `½ (a - y)²` per output neuron.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Quadratic;

impl Quadratic {
    pub fn new() -> Self {
        Self
    }

    pub fn cost(&self, y: f64, a: f64) -> f64 {
        0.5 * (a - y).powi(2)
    }

    pub fn derivative(&self, y: f64, a: f64) -> f64 {
        a - y
    }
}
