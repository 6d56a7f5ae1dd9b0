use super::{Optimizer, optimizer::check_shapes};
use crate::{
    Result,
    arch::{Gradient, Network},
};

/// L2-regularized gradient descent.
///
/// Biases take a plain step against their gradient, weights are first shrunk by
/// `1 - learning_rate * weight_decay` and then take the step.
#[derive(Debug)]
pub struct GradientDescent {
    learning_rate: f64,
    weight_decay: f64,
}

impl GradientDescent {
    /// Creates a new `GradientDescent` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `weight_decay` - The regularization strength divided by the size of the training set.
    ///
    /// # Returns
    /// A new `GradientDescent` instance.
    pub fn new(learning_rate: f64, weight_decay: f64) -> Self {
        Self {
            learning_rate,
            weight_decay,
        }
    }
}

impl Optimizer for GradientDescent {
    fn update_params(&mut self, grad: &Gradient, net: &mut Network) -> Result<()> {
        check_shapes(grad, net)?;

        let lr = self.learning_rate;
        let decay = 1. - lr * self.weight_decay;

        for ((mut w, mut b), (gw, gb)) in net.params_mut().zip(grad.params()) {
            b.scaled_add(-lr, gb);
            w.zip_mut_with(gw, |w, &g| *w = *w * decay - lr * g);
        }

        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }
}
