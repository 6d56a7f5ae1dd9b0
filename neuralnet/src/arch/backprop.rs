use std::ops::AddAssign;

use ndarray::{
    Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis, linalg,
};

use super::{Network, classifiable::Classifiable};
use crate::{Result, training::DropoutMask};

/// The partial derivatives of the cost with respect to every weight and bias of a network.
///
/// It has the same layout as the network it was created for, including the empty input slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
}

impl Gradient {
    /// Creates an all-zero gradient shaped after `net`.
    pub fn zeros(net: &Network) -> Self {
        let weights = (0..net.layers())
            .map(|i| Array2::zeros(net.weights(i).dim()))
            .collect();

        let biases = (0..net.layers())
            .map(|i| Array1::zeros(net.biases(i).len()))
            .collect();

        Self { weights, biases }
    }

    /// The amount of layers including the input layer.
    pub fn layers(&self) -> usize {
        self.weights.len()
    }

    /// `∂C/∂w` for the weight matrix of `layer`.
    ///
    /// # Panics
    /// If `layer` is out of bounds.
    pub fn weights(&self, layer: usize) -> ArrayView2<'_, f64> {
        self.weights[layer].view()
    }

    /// `∂C/∂b` for the bias vector of `layer`.
    ///
    /// # Panics
    /// If `layer` is out of bounds.
    pub fn biases(&self, layer: usize) -> ArrayView1<'_, f64> {
        self.biases[layer].view()
    }

    /// Mutable access to the weight derivatives of `layer`.
    ///
    /// # Panics
    /// If `layer` is out of bounds.
    pub fn weights_mut(&mut self, layer: usize) -> ArrayViewMut2<'_, f64> {
        self.weights[layer].view_mut()
    }

    /// Mutable access to the bias derivatives of `layer`.
    ///
    /// # Panics
    /// If `layer` is out of bounds.
    pub fn biases_mut(&mut self, layer: usize) -> ArrayViewMut1<'_, f64> {
        self.biases[layer].view_mut()
    }

    /// Yields the weight and bias derivatives of layers `1..=k`, in order.
    pub fn params(&self) -> impl Iterator<Item = (&Array2<f64>, &Array1<f64>)> {
        self.weights.iter().zip(&self.biases).skip(1)
    }

    /// Multiplies every derivative by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.weights.iter_mut().for_each(|w| *w *= factor);
        self.biases.iter_mut().for_each(|b| *b *= factor);
    }
}

impl AddAssign<&Gradient> for Gradient {
    fn add_assign(&mut self, rhs: &Gradient) {
        self.weights
            .iter_mut()
            .zip(&rhs.weights)
            .for_each(|(w, dw)| *w += dw);

        self.biases
            .iter_mut()
            .zip(&rhs.biases)
            .for_each(|(b, db)| *b += db);
    }
}

/// Computes the gradient of the cost of a single sample and adds it onto `grad`.
///
/// Every weighted sum `z` and activation `a` of the forward pass is kept, then the errors are
/// propagated from the output layer back to the first hidden layer:
///
/// * output layer: `e_k = act'(z_k) * ∂C/∂a_k`
/// * hidden layers: `e_i = act'(z_i) * (W_{i+1}^T e_{i+1})`
///
/// and `∂C/∂b_i = e_i`, `∂C/∂W_i = e_i a_{i-1}^T`.
///
/// With a dropout `mask` the hidden activations are multiplied by the mask's scales, dropped
/// neurons output zero and receive no gradient.
///
/// # Arguments
/// * `net` - The network to differentiate.
/// * `sample` - The labeled sample.
/// * `mask` - An optional dropout mask drawn for `net`'s topology.
/// * `grad` - The gradient accumulator, shaped after `net`.
///
/// # Returns
/// The cost of the sample, or an error if its dimensions don't match the network. Nothing is
/// written onto `grad` on error.
pub fn backprop<S: Classifiable>(
    net: &Network,
    sample: &S,
    mask: Option<&DropoutMask>,
    grad: &mut Gradient,
) -> Result<f64> {
    let x = sample.input();
    let y = sample.expected_output();
    net.check_input(x.len())?;
    net.check_output(y.len())?;

    let act_fn = net.act_fn();
    let loss_fn = net.loss_fn();
    let k = net.layers() - 1;
    let scales = |layer: usize| mask.and_then(|mask| mask.scales(layer));

    // Forward metadata
    let mut zs = Vec::with_capacity(k + 1);
    let mut activations = Vec::with_capacity(k + 1);
    zs.push(Array1::zeros(0));
    activations.push(x.to_owned());

    for (i, (w, b)) in (1..).zip(net.params()) {
        let z = w.dot(&activations[i - 1]) + b;
        let mut a = z.mapv(|z| act_fn.f(z));

        if let Some(scales) = scales(i) {
            a *= &scales;
        }

        zs.push(z);
        activations.push(a);
    }

    let output = &activations[k];
    let cost: f64 = y
        .iter()
        .zip(output)
        .map(|(&y, &a)| loss_fn.cost(y, a))
        .sum();

    let mut e = Array1::from_shape_fn(output.len(), |j| {
        act_fn.df(zs[k][j]) * loss_fn.derivative(y[j], output[j])
    });

    for i in (1..=k).rev() {
        grad.biases[i] += &e;

        let e_col = e.view().insert_axis(Axis(1));
        let a_row = activations[i - 1].view().insert_axis(Axis(0));
        linalg::general_mat_mul(1., &e_col, &a_row, 1., &mut grad.weights[i]);

        if i > 1 {
            let mut prev = net.weights(i).t().dot(&e);
            prev.zip_mut_with(&zs[i - 1], |x, &z| *x *= act_fn.df(z));

            if let Some(scales) = scales(i - 1) {
                prev *= &scales;
            }

            e = prev;
        }
    }

    Ok(cost)
}
