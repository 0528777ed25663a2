//! Contract for ranking-quality metrics.

use interactions::ItemId;
use std::collections::HashSet;

/// Scores one recommendation list against the items a user actually bought.
///
/// ## Design Note
/// - Metrics are injected as `&dyn Metric`, so the evaluator never matches on names
/// - `Send + Sync` lets the evaluator score users in parallel
/// - Scores are in `[0, 1]`; degenerate inputs (`k = 0`, no ground truth) score 0
pub trait Metric: Send + Sync {
    /// Returns the name of this metric (for logging/reports)
    fn name(&self) -> &str;

    /// Score the first `k` entries of `recommended` against `actual`.
    fn score(&self, recommended: &[ItemId], actual: &[ItemId], k: usize) -> f64;
}

/// Distinct relevant ids among the first `k` recommendations
pub(crate) fn hits_at_k(recommended: &[ItemId], actual: &[ItemId], k: usize) -> usize {
    let actual: HashSet<ItemId> = actual.iter().copied().collect();
    let top: HashSet<ItemId> = recommended.iter().take(k).copied().collect();
    top.intersection(&actual).count()
}
