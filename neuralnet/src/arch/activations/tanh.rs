/// The hyperbolic tangent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tanh;

impl Tanh {
    pub fn new() -> Self {
        Self
    }

    pub fn f(&self, z: f64) -> f64 {
        z.tanh()
    }

    pub fn df(&self, z: f64) -> f64 {
        let a = z.tanh();
        1. - a * a
    }
}
