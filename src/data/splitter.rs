// ============================================================
// Layer 4 — Train/Test/Validation Splitter
// ============================================================
// Shuffles every sample with a seeded RNG and cuts the list
// into three disjoint parts:
//
//   test       = round(total × test_ratio)
//   validation = round((total − test) × val_ratio)   (if enabled)
//   train      = everything left over
//
// e.g. 1000 samples, test_ratio 0.1, val_ratio 0.1
//      → 100 test, 90 validation, 810 train
//
// ChaCha8Rng keeps the split identical across runs and
// platforms for the same seed, so a restored run sees the
// same test set it was trained against.

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::sample::{ClassIndex, Split};
use crate::domain::traits::SampleSource;

/// How a dataset is divided between test, validation and training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub test_ratio: f64,
    pub validation: bool,
    pub val_ratio:  f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self { test_ratio: 0.1, validation: true, val_ratio: 0.1 }
    }
}

impl SplitRatios {
    /// Both ratios in [0, 1) and their sum below 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |v: f64| (0.0..1.0).contains(&v);
        if !in_range(self.test_ratio) {
            return Err(ConfigError::RatioOutOfRange { name: "test ratio", value: self.test_ratio });
        }
        if self.validation {
            if !in_range(self.val_ratio) {
                return Err(ConfigError::RatioOutOfRange {
                    name:  "validation ratio",
                    value: self.val_ratio,
                });
            }
            let sum = self.test_ratio + self.val_ratio;
            if sum >= 1.0 {
                return Err(ConfigError::RatiosTooLarge(sum));
            }
        }
        Ok(())
    }

    /// (test, validation) sizes for a dataset of `total` samples
    pub fn counts(&self, total: usize) -> (usize, usize) {
        let test = ((total as f64) * self.test_ratio).round() as usize;
        let test = test.min(total);
        let val = if self.validation {
            (((total - test) as f64) * self.val_ratio).round() as usize
        } else {
            0
        };
        (test, val.min(total - test))
    }
}

/// Shuffle `samples` and split them into (train, test, validation).
pub fn split_samples<T>(
    mut samples: Vec<T>,
    ratios:      &SplitRatios,
    seed:        u64,
) -> Result<(Vec<T>, Vec<T>, Vec<T>), ConfigError> {
    ratios.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total = samples.len();
    let (n_test, n_val) = ratios.counts(total);

    // split_off(n) keeps [0..n) and returns [n..)
    let mut rest   = samples.split_off(n_test);
    let test       = samples;
    let train      = rest.split_off(n_val);
    let validation = rest;

    tracing::debug!(
        "Dataset split: {} train, {} test, {} validation",
        train.len(),
        test.len(),
        validation.len()
    );

    Ok((train, test, validation))
}

/// List every sample from `source` and split it by `ratios`.
pub fn data_split(
    source: &impl SampleSource,
    ratios: &SplitRatios,
    seed:   u64,
) -> Result<(ClassIndex, Split)> {
    ratios.validate()?;
    let (classes, samples) = source.load_all()?;
    let (train, test, validation) = split_samples(samples, ratios, seed)?;
    Ok((classes, Split { train, test, validation }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::Sample;
    use std::collections::HashSet;

    fn ratios(test_ratio: f64, validation: bool, val_ratio: f64) -> SplitRatios {
        SplitRatios { test_ratio, validation, val_ratio }
    }

    #[test]
    fn test_thousand_sample_scenario() {
        let items: Vec<usize> = (0..1000).collect();
        let (train, test, val) = split_samples(items, &ratios(0.1, true, 0.1), 7).unwrap();
        assert_eq!(test.len(), 100);
        assert_eq!(val.len(), 90);
        assert_eq!(train.len(), 810);
    }

    #[test]
    fn test_counts_sum_and_sets_disjoint() {
        for (total, t, v) in [(0, 0.2, 0.3), (1, 0.5, 0.5), (7, 0.3, 0.4), (333, 0.0, 0.25), (50, 0.9, 0.05)] {
            let items: Vec<usize> = (0..total).collect();
            let (train, test, val) = split_samples(items, &ratios(t, true, v), 42).unwrap();
            assert_eq!(train.len() + test.len() + val.len(), total);

            let mut seen = HashSet::new();
            for x in train.iter().chain(&test).chain(&val) {
                assert!(seen.insert(*x), "{x} appears twice");
            }
        }
    }

    #[test]
    fn test_validation_disabled_ignores_val_ratio() {
        let items: Vec<usize> = (0..20).collect();
        let (train, test, val) = split_samples(items, &ratios(0.25, false, 0.99), 1).unwrap();
        assert_eq!(test.len(), 5);
        assert!(val.is_empty());
        assert_eq!(train.len(), 15);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_samples((0..100).collect::<Vec<_>>(), &SplitRatios::default(), 3).unwrap();
        let b = split_samples((0..100).collect::<Vec<_>>(), &SplitRatios::default(), 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_ratios_rejected() {
        assert!(matches!(
            ratios(1.0, false, 0.0).validate(),
            Err(ConfigError::RatioOutOfRange { .. })
        ));
        assert!(matches!(
            ratios(0.1, true, -0.1).validate(),
            Err(ConfigError::RatioOutOfRange { .. })
        ));
        assert!(matches!(
            ratios(0.6, true, 0.4).validate(),
            Err(ConfigError::RatiosTooLarge(_))
        ));
        assert!(split_samples(vec![1, 2, 3], &ratios(0.7, true, 0.5), 0).is_err());
    }

    struct FixedSource(usize);

    impl SampleSource for FixedSource {
        fn load_all(&self) -> Result<(ClassIndex, Vec<Sample>)> {
            let samples = (0..self.0)
                .map(|i| Sample::new(format!("img_{i}.png"), i % 2))
                .collect();
            Ok((ClassIndex::new(vec!["a".into(), "b".into()]), samples))
        }
    }

    #[test]
    fn test_data_split_from_source() {
        let (classes, split) = data_split(&FixedSource(40), &ratios(0.1, true, 0.25), 9).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(split.total(), 40);
        assert_eq!(split.test.len(), 4);
        assert_eq!(split.validation.len(), 9);
        assert!(split.is_disjoint());
    }
}
