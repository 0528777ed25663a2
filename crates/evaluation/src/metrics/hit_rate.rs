//! Whether anything relevant made it into the top k.

use crate::traits::{Metric, hits_at_k};
use interactions::ItemId;

pub struct HitRateAtK;

impl Metric for HitRateAtK {
    fn name(&self) -> &str {
        "hit_rate"
    }

    fn score(&self, recommended: &[ItemId], actual: &[ItemId], k: usize) -> f64 {
        if hits_at_k(recommended, actual, k) > 0 { 1.0 } else { 0.0 }
    }
}
