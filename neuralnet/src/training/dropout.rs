use ndarray::{Array1, ArrayView1};
use rand::Rng;

/// The neurons kept alive for the training pass of a single sample.
///
/// Only hidden layers are masked. Kept neurons are scaled by `1 / p` so that the expected input of
/// the following layer matches the unmasked network, which is then used as is for inference.
#[derive(Clone, Debug, PartialEq)]
pub struct DropoutMask {
    scales: Vec<Array1<f64>>,
}

impl DropoutMask {
    /// Draws a new mask, keeping every hidden neuron independently with probability `keep`.
    ///
    /// # Arguments
    /// * `topology` - The layer sizes of the network the mask is for.
    /// * `keep` - The probability of keeping a neuron, in `(0, 1]`.
    /// * `rng` - The random number generator to draw the mask with.
    pub fn sample<R: Rng + ?Sized>(topology: &[usize], keep: f64, rng: &mut R) -> Self {
        let scale = 1. / keep;
        let last = topology.len().saturating_sub(1);
        let mut scales = Vec::with_capacity(topology.len());

        for (i, &n) in topology.iter().enumerate() {
            if i == 0 || i == last {
                scales.push(Array1::zeros(0));
                continue;
            }

            let mut layer = Array1::zeros(n);
            layer.mapv_inplace(|_: f64| if rng.random_bool(keep) { scale } else { 0. });
            scales.push(layer);
        }

        Self { scales }
    }

    #[cfg(test)]
    pub(crate) fn from_scales(scales: Vec<Array1<f64>>) -> Self {
        Self { scales }
    }

    /// The activation multipliers of `layer`, `None` for the input and output layers.
    pub fn scales(&self, layer: usize) -> Option<ArrayView1<'_, f64>> {
        self.scales
            .get(layer)
            .filter(|scales| !scales.is_empty())
            .map(|scales| scales.view())
    }

    /// The amount of kept neurons of `layer`.
    pub fn kept(&self, layer: usize) -> usize {
        self.scales(layer)
            .map_or(0, |scales| scales.iter().filter(|&&s| s != 0.).count())
    }
}
