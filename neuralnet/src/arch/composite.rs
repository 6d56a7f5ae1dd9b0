use super::{Network, classifiable::Classifiable};
use crate::{MlErr, Result};

/// An ensemble of trained networks that classifies by majority vote.
///
/// Ties between the most voted labels are broken in favour of the label that was produced first,
/// following the order of the networks.
#[derive(Clone, Debug)]
pub struct CompositeClassifier {
    networks: Vec<Network>,
}

impl CompositeClassifier {
    /// Creates a new `CompositeClassifier`.
    ///
    /// # Returns
    /// An error if `networks` is empty.
    pub fn new(networks: Vec<Network>) -> Result<Self> {
        if networks.is_empty() {
            return Err(MlErr::EmptyEnsemble);
        }

        Ok(Self { networks })
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// Classifies `sample` with every network and returns the most voted label.
    pub fn classify<S: Classifiable>(&self, sample: &S) -> Result<S::Label> {
        let mut tallies: Vec<(S::Label, usize)> = Vec::new();

        for net in &self.networks {
            let label = net.classify(sample)?;

            match tallies.iter_mut().find(|(seen, _)| *seen == label) {
                Some((_, votes)) => *votes += 1,
                None => tallies.push((label, 1)),
            }
        }

        let mut winner = 0;
        for (i, (_, votes)) in tallies.iter().enumerate() {
            if *votes > tallies[winner].1 {
                winner = i;
            }
        }

        Ok(tallies.swap_remove(winner).0)
    }

    /// Counts the samples whose majority vote matches their own label.
    pub fn evaluate<S: Classifiable>(&self, samples: &[S]) -> Result<usize> {
        let mut correct = 0;

        for sample in samples {
            if self.classify(sample)? == sample.label() {
                correct += 1;
            }
        }

        Ok(correct)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2, array};

    use super::*;
    use crate::arch::{LabeledSample, activations::ActFn, loss::LossFn};

    /// A network that classifies every input as `class`.
    fn voter(class: usize) -> Network {
        let mut bias = Array1::zeros(3);
        bias[class] = 1.;

        Network::from_params(
            vec![Array2::zeros((3, 1))],
            vec![bias],
            ActFn::sigmoid(),
            LossFn::quadratic(),
        )
        .unwrap()
    }

    fn classify(votes: &[usize]) -> usize {
        let composite = CompositeClassifier::new(votes.iter().map(|&c| voter(c)).collect()).unwrap();
        composite
            .classify(&LabeledSample::new(array![0.5], 0, 3))
            .unwrap()
    }

    #[test]
    fn majority_wins() {
        assert_eq!(classify(&[1, 2, 1]), 1);
        assert_eq!(classify(&[2, 0, 0]), 0);
        assert_eq!(classify(&[2, 1, 1, 2, 1]), 1);
    }

    #[test]
    fn ties_prefer_the_first_seen_label() {
        assert_eq!(classify(&[2, 1, 0]), 2);
        assert_eq!(classify(&[0, 1, 1, 0]), 0);
        assert_eq!(classify(&[1, 2, 2, 1, 0]), 1);
    }

    #[test]
    fn needs_at_least_one_network() {
        let err = CompositeClassifier::new(vec![]).unwrap_err();
        assert!(matches!(err, MlErr::EmptyEnsemble));
    }

    #[test]
    fn evaluates_against_labels() {
        let composite = CompositeClassifier::new(vec![voter(1), voter(1), voter(0)]).unwrap();
        let samples = [
            LabeledSample::new(array![0.], 1, 3),
            LabeledSample::new(array![1.], 0, 3),
            LabeledSample::new(array![2.], 1, 3),
        ];

        assert_eq!(composite.evaluate(&samples).unwrap(), 2);
    }

    #[test]
    fn mismatched_samples_are_errors() {
        let composite = CompositeClassifier::new(vec![voter(0)]).unwrap();
        let sample = LabeledSample::new(array![0., 1.], 0, 3);

        assert!(composite.classify(&sample).is_err());
    }
}
