use ndarray::{Array1, ArrayView1, CowArray, Ix1};

/// Something a network can learn to classify.
///
/// Implementors provide the numeric input fed into the network, the output the network is
/// expected to produce for it, their true label and how raw network outputs map back to labels.
pub trait Classifiable {
    type Label: PartialEq + Clone;

    /// The input vector of the network for this sample.
    fn input(&self) -> CowArray<'_, f64, Ix1>;

    /// The output vector a perfectly trained network would produce for this sample.
    fn expected_output(&self) -> CowArray<'_, f64, Ix1>;

    /// The true label of this sample.
    fn label(&self) -> Self::Label;

    /// Decodes the activations of a network's output layer into a label.
    fn to_label(&self, output: ArrayView1<f64>) -> Self::Label;
}

/// A dense sample labeled with a class index.
///
/// The expected output is the one-hot encoding of the class, network outputs are decoded to the
/// index of their maximum activation (the earliest one on ties).
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledSample {
    input: Array1<f64>,
    expected: Array1<f64>,
    class: usize,
}

impl LabeledSample {
    /// Creates a new `LabeledSample`.
    ///
    /// # Arguments
    /// * `input` - The input vector.
    /// * `class` - The index of the class this sample belongs to.
    /// * `classes` - The total amount of classes.
    ///
    /// # Panics
    /// If `class` is not lower than `classes`.
    pub fn new(input: Array1<f64>, class: usize, classes: usize) -> Self {
        assert!(class < classes, "class {class} out of {classes} classes");

        let mut expected = Array1::zeros(classes);
        expected[class] = 1.;

        Self {
            input,
            expected,
            class,
        }
    }

    pub fn class(&self) -> usize {
        self.class
    }
}

impl Classifiable for LabeledSample {
    type Label = usize;

    fn input(&self) -> CowArray<'_, f64, Ix1> {
        self.input.view().into()
    }

    fn expected_output(&self) -> CowArray<'_, f64, Ix1> {
        self.expected.view().into()
    }

    fn label(&self) -> usize {
        self.class
    }

    fn to_label(&self, output: ArrayView1<f64>) -> usize {
        argmax(output)
    }
}

/// The index of the first maximum of `v`, `0` for empty vectors.
pub fn argmax(v: ArrayView1<f64>) -> usize {
    let mut best = 0;

    for (i, &x) in v.iter().enumerate() {
        if x > v[best] {
            best = i;
        }
    }

    best
}
