// ============================================================
// Layer 4 - Train/Validation/Test Splitter
// ============================================================
// Shuffles samples with a seeded RNG and splits them into three
// disjoint partitions (default 80% / 10% / 10%).
//
// Train and validation sizes are floored; the test split takes
// the remainder, so the three sizes always sum to the input size.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub val:   f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self { train: 0.8, val: 0.1 }
    }
}

impl SplitRatios {
    pub fn test(&self) -> f64 {
        (1.0 - self.train - self.val).max(0.0)
    }
}

/// The three disjoint partitions
#[derive(Debug, Clone)]
pub struct DataSplit<T> {
    pub train: Vec<T>,
    pub val:   Vec<T>,
    pub test:  Vec<T>,
}

impl<T> DataSplit<T> {
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }
}

/// Shuffle `samples` with `seed` and split by `ratios`.
pub fn split_train_val_test<T>(mut samples: Vec<T>, ratios: SplitRatios, seed: u64) -> DataSplit<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total   = samples.len();
    let n_train = ((total as f64) * ratios.train).floor() as usize;
    let n_val   = ((total as f64) * ratios.val).floor() as usize;

    let n_train = n_train.min(total);
    let n_val   = n_val.min(total - n_train);

    // split_off(n) leaves [0..n) in place and returns [n..)
    let mut rest = samples.split_off(n_train);
    let test     = rest.split_off(n_val);

    tracing::debug!(
        "Dataset split: {} train, {} validation, {} test",
        samples.len(),
        rest.len(),
        test.len(),
    );

    DataSplit { train: samples, val: rest, test }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let split = split_train_val_test(items, SplitRatios::default(), 42);
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.val.len(), 10);
        assert_eq!(split.test.len(), 10);
    }

    #[test]
    fn test_sizes_sum_to_total_with_rounding() {
        for total in [0usize, 1, 7, 9, 11, 55, 123] {
            let items: Vec<usize> = (0..total).collect();
            let split = split_train_val_test(items, SplitRatios::default(), 7);
            assert_eq!(split.total(), total);
            assert!(split.train.len() as f64 <= total as f64 * 0.8);
            assert!(split.train.len() as f64 > total as f64 * 0.8 - 1.0);
            assert!(split.val.len() as f64 > total as f64 * 0.1 - 1.0);
        }
    }

    #[test]
    fn test_partitions_are_disjoint() {
        let items: Vec<usize> = (0..200).collect();
        let split = split_train_val_test(items, SplitRatios::default(), 3);

        let train: HashSet<_> = split.train.iter().copied().collect();
        let val:   HashSet<_> = split.val.iter().copied().collect();
        let test:  HashSet<_> = split.test.iter().copied().collect();

        assert!(train.is_disjoint(&val));
        assert!(train.is_disjoint(&test));
        assert!(val.is_disjoint(&test));
        assert_eq!(train.len() + val.len() + test.len(), 200);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_val_test((0..50).collect::<Vec<_>>(), SplitRatios::default(), 11);
        let b = split_train_val_test((0..50).collect::<Vec<_>>(), SplitRatios::default(), 11);
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn test_remaining_ratio() {
        assert!((SplitRatios::default().test() - 0.1).abs() < 1e-9);
    }
}
