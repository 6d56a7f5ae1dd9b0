use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Normal;

use super::{activations::ActFn, classifiable::Classifiable, loss::LossFn};
use crate::{MlErr, Result};

/// A fully connected feedforward network: the layer sizes, the parameters of every layer and the
/// activation and cost functions used to run and train it.
///
/// The parameters are indexed by layer number. The input layer (index `0`) has no parameters, its
/// slots are kept empty so that `weights(i)` and `biases(i)` line up with layer `i`. The weight
/// matrix of layer `i` has shape `n_i x n_{i-1}`, its row `j` holds the weights from every neuron
/// of layer `i - 1` into neuron `j`.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    topology: Vec<usize>,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    act_fn: ActFn,
    loss_fn: LossFn,
}

impl Network {
    /// Creates a new randomly initialized `Network` using the thread's random number generator.
    ///
    /// # Arguments
    /// * `topology` - The amount of neurons of every layer, starting with the input layer.
    /// * `act_fn` - The activation function of every neuron.
    /// * `loss_fn` - The cost function the network is trained against.
    ///
    /// # Returns
    /// A new `Network` or an error if the topology is invalid or the functions can't be paired.
    pub fn new(topology: &[usize], act_fn: ActFn, loss_fn: LossFn) -> Result<Self> {
        Self::random(topology, act_fn, loss_fn, &mut rand::rng())
    }

    /// Creates a new randomly initialized `Network`.
    ///
    /// Biases are sampled from a standard normal distribution, the weights of layer `i` from a
    /// normal distribution with mean 0 and standard deviation `1 / sqrt(n_{i-1})`.
    ///
    /// # Arguments
    /// * `topology` - The amount of neurons of every layer, starting with the input layer.
    /// * `act_fn` - The activation function of every neuron.
    /// * `loss_fn` - The cost function the network is trained against.
    /// * `rng` - The random number generator to sample the parameters with.
    ///
    /// # Returns
    /// A new `Network` or an error if the topology is invalid or the functions can't be paired.
    pub fn random<R: Rng + ?Sized>(
        topology: &[usize],
        act_fn: ActFn,
        loss_fn: LossFn,
        rng: &mut R,
    ) -> Result<Self> {
        validate(topology, &act_fn, &loss_fn)?;

        let mut weights = vec![Array2::zeros((0, 0))];
        let mut biases = vec![Array1::zeros(0)];

        for dim in topology.windows(2) {
            let (fan_in, fan_out) = (dim[0], dim[1]);
            let std_dev = 1. / (fan_in as f64).sqrt();

            weights.push(Array2::random_using(
                (fan_out, fan_in),
                Normal::new(0., std_dev)?,
                rng,
            ));
            biases.push(Array1::random_using(fan_out, Normal::new(0., 1.)?, rng));
        }

        Ok(Self {
            topology: topology.to_vec(),
            weights,
            biases,
            act_fn,
            loss_fn,
        })
    }

    /// Creates a new `Network` with every parameter set to zero.
    ///
    /// # Returns
    /// A new `Network` or an error if the topology is invalid or the functions can't be paired.
    pub fn zeros(topology: &[usize], act_fn: ActFn, loss_fn: LossFn) -> Result<Self> {
        validate(topology, &act_fn, &loss_fn)?;

        let weights = std::iter::once(Array2::zeros((0, 0)))
            .chain(topology.windows(2).map(|dim| Array2::zeros((dim[1], dim[0]))))
            .collect();

        let biases = std::iter::once(Array1::zeros(0))
            .chain(topology[1..].iter().map(|&n| Array1::zeros(n)))
            .collect();

        Ok(Self {
            topology: topology.to_vec(),
            weights,
            biases,
            act_fn,
            loss_fn,
        })
    }

    /// Creates a new `Network` out of explicit parameters.
    ///
    /// # Arguments
    /// * `weights` - The weight matrices of layers `1..=k`, the input layer must not be included.
    /// * `biases` - The bias vectors of layers `1..=k`.
    /// * `act_fn` - The activation function of every neuron.
    /// * `loss_fn` - The cost function the network is trained against.
    ///
    /// # Returns
    /// A new `Network` or an error if the shapes don't chain into a valid topology.
    pub fn from_params(
        weights: Vec<Array2<f64>>,
        biases: Vec<Array1<f64>>,
        act_fn: ActFn,
        loss_fn: LossFn,
    ) -> Result<Self> {
        if weights.len() != biases.len() {
            return Err(MlErr::SizeMismatch {
                what: "bias vectors",
                got: biases.len(),
                expected: weights.len(),
            });
        }

        let Some(first) = weights.first() else {
            return Err(MlErr::InvalidTopology {
                reason: "a network needs at least one layer of parameters",
            });
        };

        let mut topology = vec![first.ncols()];
        for (w, b) in weights.iter().zip(&biases) {
            let fan_in = topology[topology.len() - 1];

            if w.ncols() != fan_in {
                return Err(MlErr::SizeMismatch {
                    what: "weight matrix columns",
                    got: w.ncols(),
                    expected: fan_in,
                });
            }

            if b.len() != w.nrows() {
                return Err(MlErr::SizeMismatch {
                    what: "bias vector",
                    got: b.len(),
                    expected: w.nrows(),
                });
            }

            topology.push(w.nrows());
        }

        let mut net = Self::zeros(&topology, act_fn, loss_fn)?;
        net.weights[1..]
            .iter_mut()
            .zip(weights)
            .for_each(|(dst, src)| *dst = src);
        net.biases[1..]
            .iter_mut()
            .zip(biases)
            .for_each(|(dst, src)| *dst = src);

        Ok(net)
    }

    /// The amount of neurons of every layer, starting with the input layer.
    pub fn topology(&self) -> &[usize] {
        &self.topology
    }

    /// The amount of layers including the input layer.
    pub fn layers(&self) -> usize {
        self.topology.len()
    }

    /// The dimension of the inputs this network accepts.
    pub fn input_size(&self) -> usize {
        self.topology[0]
    }

    /// The dimension of the outputs this network produces.
    pub fn output_size(&self) -> usize {
        self.topology[self.topology.len() - 1]
    }

    /// The weight matrix of `layer`, it's empty for the input layer.
    ///
    /// # Panics
    /// If `layer` is out of bounds.
    pub fn weights(&self, layer: usize) -> ArrayView2<'_, f64> {
        self.weights[layer].view()
    }

    /// The bias vector of `layer`, it's empty for the input layer.
    ///
    /// # Panics
    /// If `layer` is out of bounds.
    pub fn biases(&self, layer: usize) -> ArrayView1<'_, f64> {
        self.biases[layer].view()
    }

    /// Yields the weights and biases of layers `1..=k`, in order.
    pub fn params(&self) -> impl Iterator<Item = (&Array2<f64>, &Array1<f64>)> {
        self.weights.iter().zip(&self.biases).skip(1)
    }

    /// Yields mutable views of the weights and biases of layers `1..=k`, in order.
    ///
    /// Only the values can be changed, the shapes stay tied to the topology.
    pub fn params_mut(
        &mut self,
    ) -> impl Iterator<Item = (ArrayViewMut2<'_, f64>, ArrayViewMut1<'_, f64>)> {
        self.weights
            .iter_mut()
            .zip(self.biases.iter_mut())
            .skip(1)
            .map(|(w, b)| (w.view_mut(), b.view_mut()))
    }

    pub fn act_fn(&self) -> &ActFn {
        &self.act_fn
    }

    pub fn loss_fn(&self) -> &LossFn {
        &self.loss_fn
    }

    /// Replaces the activation function of this network.
    ///
    /// # Returns
    /// An error if the current cost function isn't defined for the new activation function.
    pub fn set_act_fn(&mut self, act_fn: ActFn) -> Result<()> {
        check_pairing(&act_fn, &self.loss_fn)?;
        self.act_fn = act_fn;
        Ok(())
    }

    /// Replaces the cost function of this network.
    ///
    /// # Returns
    /// An error if the new cost function isn't defined for the current activation function.
    pub fn set_loss_fn(&mut self, loss_fn: LossFn) -> Result<()> {
        check_pairing(&self.act_fn, &loss_fn)?;
        self.loss_fn = loss_fn;
        Ok(())
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `x` - The input vector.
    ///
    /// # Returns
    /// The activations of the output layer or an error if `x` doesn't match the input layer.
    pub fn forward(&self, x: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_input(x.len())?;

        let mut a = x.to_owned();
        for (w, b) in self.params() {
            let mut z = w.dot(&a) + b;
            z.mapv_inplace(|z| self.act_fn.f(z));
            a = z;
        }

        Ok(a)
    }

    /// Runs `sample` through the network and lets it decode the output into a label.
    pub fn classify<S: Classifiable>(&self, sample: &S) -> Result<S::Label> {
        let output = self.forward(sample.input().view())?;
        Ok(sample.to_label(output.view()))
    }

    /// Counts the samples whose classification matches their own label.
    pub fn evaluate<S: Classifiable>(&self, samples: &[S]) -> Result<usize> {
        let mut correct = 0;

        for sample in samples {
            if self.classify(sample)? == sample.label() {
                correct += 1;
            }
        }

        Ok(correct)
    }

    pub(crate) fn check_input(&self, len: usize) -> Result<()> {
        if len != self.input_size() {
            return Err(MlErr::SizeMismatch {
                what: "input vector",
                got: len,
                expected: self.input_size(),
            });
        }

        Ok(())
    }

    pub(crate) fn check_output(&self, len: usize) -> Result<()> {
        if len != self.output_size() {
            return Err(MlErr::SizeMismatch {
                what: "expected output vector",
                got: len,
                expected: self.output_size(),
            });
        }

        Ok(())
    }
}

fn validate(topology: &[usize], act_fn: &ActFn, loss_fn: &LossFn) -> Result<()> {
    if topology.len() < 2 {
        return Err(MlErr::InvalidTopology {
            reason: "a network needs an input and an output layer",
        });
    }

    if topology.contains(&0) {
        return Err(MlErr::InvalidTopology {
            reason: "every layer needs at least one neuron",
        });
    }

    check_pairing(act_fn, loss_fn)
}

pub(super) fn check_pairing(act_fn: &ActFn, loss_fn: &LossFn) -> Result<()> {
    if !loss_fn.supports(act_fn) {
        return Err(MlErr::IncompatibleLoss {
            loss: loss_fn.name(),
            act_fn: act_fn.name(),
        });
    }

    Ok(())
}
