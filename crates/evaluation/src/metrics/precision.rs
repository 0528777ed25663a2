//! Share of the top-k slots that hold a relevant item.

use crate::traits::{Metric, hits_at_k};
use interactions::ItemId;

/// `|set(rec[:k]) ∩ set(actual)| / k`
pub struct PrecisionAtK;

impl Metric for PrecisionAtK {
    fn name(&self) -> &str {
        "precision"
    }

    fn score(&self, recommended: &[ItemId], actual: &[ItemId], k: usize) -> f64 {
        if k == 0 {
            return 0.0;
        }
        hits_at_k(recommended, actual, k) as f64 / k as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_at_k() {
        let metric = PrecisionAtK;
        let score = metric.score(&[10, 20, 99, 50, 60], &[10, 20, 30], 5);
        assert!((score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_precision_divides_by_k_not_list_length() {
        // Short lists are penalised
        assert!((PrecisionAtK.score(&[10], &[10], 4) - 0.25).abs() < 1e-12);
        assert_eq!(PrecisionAtK.score(&[10], &[10], 0), 0.0);
    }

    #[test]
    fn test_precision_counts_repeats_once() {
        assert!((PrecisionAtK.score(&[10, 10], &[10], 2) - 0.5).abs() < 1e-12);
    }
}
