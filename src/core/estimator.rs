// File: src/core/estimator.rs
use serde::{Deserialize, Serialize};

/// How a tag's word counts are turned into emission probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    /// Add-one smoothing over the tag's vocabulary.
    #[default]
    Laplace,
    /// Raw relative frequency.
    Mle,
}

/// Probability estimator for a single tag, built from its count table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimator {
    kind: EstimatorKind,
    sample_size: u64,
    vocab_size: u64,
}

impl Estimator {
    pub fn new(kind: EstimatorKind, sample_size: u64, vocab_size: u64) -> Self {
        Self { kind, sample_size, vocab_size }
    }

    pub fn probability(&self, count: u64) -> f64 {
        match self.kind {
            EstimatorKind::Laplace => {
                let denominator = self.sample_size + self.vocab_size;
                if denominator == 0 {
                    0.0
                } else {
                    (count + 1) as f64 / denominator as f64
                }
            }
            EstimatorKind::Mle => {
                if self.sample_size == 0 {
                    0.0
                } else {
                    count as f64 / self.sample_size as f64
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laplace_adds_one_over_vocabulary() {
        // "dog": 3, "cat": 1 -> N = 4, V = 2
        let e = Estimator::new(EstimatorKind::Laplace, 4, 2);
        assert!((e.probability(3) - 4.0 / 6.0).abs() < 1e-12);
        assert!((e.probability(1) - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn mle_is_relative_frequency() {
        let e = Estimator::new(EstimatorKind::Mle, 4, 2);
        assert_eq!(e.probability(3), 0.75);
        assert_eq!(e.probability(0), 0.0);
    }

    #[test]
    fn empty_tables_give_zero() {
        assert_eq!(Estimator::new(EstimatorKind::Laplace, 0, 0).probability(0), 0.0);
        assert_eq!(Estimator::new(EstimatorKind::Mle, 0, 0).probability(0), 0.0);
    }
}
