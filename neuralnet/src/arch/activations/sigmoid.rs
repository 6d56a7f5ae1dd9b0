/// The logistic function `1 / (1 + e^-z)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sigmoid;

impl Sigmoid {
    pub fn new() -> Self {
        Self
    }

    pub fn f(&self, z: f64) -> f64 {
        1. / (1. + (-z).exp())
    }

    pub fn df(&self, z: f64) -> f64 {
        let a = self.f(z);
        a * (1. - a)
    }
}
