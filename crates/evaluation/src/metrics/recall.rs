//! Share of the relevant items found in the top k.

use crate::traits::{Metric, hits_at_k};
use interactions::ItemId;
use std::collections::HashSet;

/// `|set(rec[:k]) ∩ set(actual)| / |set(actual)|`
pub struct RecallAtK;

impl Metric for RecallAtK {
    fn name(&self) -> &str {
        "recall"
    }

    fn score(&self, recommended: &[ItemId], actual: &[ItemId], k: usize) -> f64 {
        let relevant = actual.iter().collect::<HashSet<_>>().len();
        if relevant == 0 {
            return 0.0;
        }
        hits_at_k(recommended, actual, k) as f64 / relevant as f64
    }
}
