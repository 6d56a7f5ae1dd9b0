use ndarray::Array2;

use super::{Optimizer, optimizer::check_shapes};
use crate::{
    Result,
    arch::{Gradient, Network},
};

/// L2-regularized gradient descent with momentum on the weights.
///
/// The velocity buffer belongs to a single training run: it starts at zero and is carried over
/// from one mini-batch to the next. Biases take plain steps.
#[derive(Debug)]
pub struct GradientDescentWithMomentum {
    learning_rate: f64,
    weight_decay: f64,
    momentum: f64,
    velocity: Vec<Array2<f64>>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer.
    ///
    /// # Arguments
    /// * `net` - The network whose weights this instance will update.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `weight_decay` - The regularization strength divided by the size of the training set.
    /// * `momentum` - The fraction of the velocity kept between updates.
    ///
    /// # Returns
    /// A new `GradientDescentWithMomentum` instance.
    pub fn new(net: &Network, learning_rate: f64, weight_decay: f64, momentum: f64) -> Self {
        let velocity = (0..net.layers())
            .map(|i| Array2::zeros(net.weights(i).dim()))
            .collect();

        Self {
            learning_rate,
            weight_decay,
            momentum,
            velocity,
        }
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, grad: &Gradient, net: &mut Network) -> Result<()> {
        check_shapes(grad, net)?;

        let lr = self.learning_rate;
        let mu = self.momentum;
        let decay = 1. - lr * self.weight_decay;

        for (((mut w, mut b), (gw, gb)), v) in net
            .params_mut()
            .zip(grad.params())
            .zip(self.velocity.iter_mut().skip(1))
        {
            b.scaled_add(-lr, gb);

            v.zip_mut_with(gw, |v, &g| *v = mu * *v - lr * g);
            w.zip_mut_with(&*v, |w, &v| *w = *w * decay + v);
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
