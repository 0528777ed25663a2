//! Normalized discounted cumulative gain with binary relevance.
//!
//! A relevant item at rank `i` (0-based) gains `1 / log2(i + 2)`. Repeated
//! ids only gain at their first rank. The ideal ranking places
//! `min(k, |actual|)` relevant items first.

use crate::traits::Metric;
use interactions::ItemId;
use std::collections::HashSet;

pub struct NdcgAtK;

fn discount(rank: usize) -> f64 {
    1.0 / (rank as f64 + 2.0).log2()
}

impl Metric for NdcgAtK {
    fn name(&self) -> &str {
        "ndcg"
    }

    fn score(&self, recommended: &[ItemId], actual: &[ItemId], k: usize) -> f64 {
        let relevant: HashSet<ItemId> = actual.iter().copied().collect();
        if relevant.is_empty() || k == 0 {
            return 0.0;
        }

        let mut seen = HashSet::new();
        let dcg: f64 = recommended
            .iter()
            .take(k)
            .enumerate()
            .filter(|(_, item)| relevant.contains(*item) && seen.insert(**item))
            .map(|(rank, _)| discount(rank))
            .sum();

        let idcg: f64 = (0..k.min(relevant.len())).map(discount).sum();
        dcg / idcg
    }
}
