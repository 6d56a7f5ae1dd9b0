use std::num::NonZeroUsize;

use rand::{Rng, seq::SliceRandom};

/// A random visiting order over the samples of a training set.
#[derive(Clone, Debug)]
pub struct BatchOrder {
    indices: Vec<usize>,
}

impl BatchOrder {
    /// Draws a uniformly random permutation of `0..len`.
    pub fn shuffled<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.shuffle(rng);
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Splits the order into mini-batches of `batch_size` indices, the last one may be shorter.
    pub fn batches(&self, batch_size: NonZeroUsize) -> impl Iterator<Item = &[usize]> {
        self.indices.chunks(batch_size.get())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(1);
        let order = BatchOrder::shuffled(100, &mut rng);

        let mut sorted = order.indices().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn every_epoch_gets_a_new_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let first = BatchOrder::shuffled(50, &mut rng);
        let second = BatchOrder::shuffled(50, &mut rng);

        assert_ne!(first.indices(), second.indices());
    }

    #[test]
    fn last_batch_holds_the_remainder() {
        let mut rng = StdRng::seed_from_u64(2);
        let order = BatchOrder::shuffled(10, &mut rng);
        let sizes: Vec<_> = order
            .batches(NonZeroUsize::new(4).unwrap())
            .map(<[usize]>::len)
            .collect();

        assert_eq!(sizes, [4, 4, 2]);
        assert_eq!(BatchOrder::shuffled(0, &mut rng).batches(NonZeroUsize::MIN).count(), 0);
    }
}
