use crate::{
    MlErr, Result,
    arch::{Gradient, Network},
};

/// Defines the strategy for updating the parameters of a network given the averaged gradient of a
/// mini-batch.
pub trait Optimizer {
    /// Takes a single step over every weight and bias of `net`.
    ///
    /// # Arguments
    /// * `grad` - The averaged gradient of the mini-batch.
    /// * `net` - The network to update.
    ///
    /// # Returns
    /// An error if the shape of `grad` doesn't match the shape of `net`, the network is left
    /// untouched in that case.
    fn update_params(&mut self, grad: &Gradient, net: &mut Network) -> Result<()>;

    /// The current length of the steps taken on `update_params`.
    fn learning_rate(&self) -> f64;

    /// Changes the length of the steps taken on the following updates.
    fn set_learning_rate(&mut self, learning_rate: f64);
}

/// Checks that `grad` has exactly the shape of `net`'s parameters.
pub(super) fn check_shapes(grad: &Gradient, net: &Network) -> Result<()> {
    if grad.layers() != net.layers() {
        return Err(MlErr::SizeMismatch {
            what: "gradient layers",
            got: grad.layers(),
            expected: net.layers(),
        });
    }

    for ((w, b), (gw, gb)) in net.params().zip(grad.params()) {
        if gw.dim() != w.dim() {
            return Err(MlErr::SizeMismatch {
                what: "weight gradient",
                got: gw.len(),
                expected: w.len(),
            });
        }

        if gb.len() != b.len() {
            return Err(MlErr::SizeMismatch {
                what: "bias gradient",
                got: gb.len(),
                expected: b.len(),
            });
        }
    }

    Ok(())
}
