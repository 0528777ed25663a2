//! Contracts every recommendation model exposes to the engine.
//!
//! The engine never looks inside a model: it fits it once on the weighted
//! interaction matrix and then only asks for ranked `(index, score)` lists.

use interactions::{InteractionMatrix, Result, SparseRow};
use ndarray::ArrayView2;
use std::cmp::Ordering;

/// A ranked matrix index (item or user) with the model's score for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredIndex {
    pub index: usize,
    pub score: f32,
}

impl ScoredIndex {
    pub fn new(index: usize, score: f32) -> Self {
        Self { index, score }
    }
}

/// Core trait for anything that can rank items for a user.
///
/// ## Design Note
/// - `Send + Sync` lets the evaluator fan users out across threads
/// - `fit` is the only `&mut` method; fitted state is immutable afterwards
/// - already interacted items are NOT filtered, only `exclude` is
pub trait Recommender: Send + Sync {
    /// Returns the name of this model (for logging/debugging)
    fn name(&self) -> &str;

    /// Train on a user×item matrix, replacing any previous state.
    fn fit(&mut self, matrix: &InteractionMatrix) -> Result<()>;

    fn is_fitted(&self) -> bool;

    /// Rank up to `n` items for a user.
    ///
    /// # Arguments
    /// * `user_index` - Matrix row of the user (may be past the fitted rows for cold users)
    /// * `user_row` - The user's current interaction row
    /// * `n` - Maximum number of items to return
    /// * `exclude` - Item indices that must not be returned
    ///
    /// # Returns
    /// * `Ok(Vec<ScoredIndex>)` - Items ordered by descending score
    /// * `Err(ModelNotFitted)` - If called before `fit`
    fn recommend(
        &self,
        user_index: usize,
        user_row: SparseRow<'_>,
        n: usize,
        exclude: &[usize],
    ) -> Result<Vec<ScoredIndex>>;
}

/// Models with latent representations that support similarity queries.
///
/// Similarity lists include the query itself as the top entry; callers that
/// want "other" items or users must skip it.
pub trait SimilarityModel: Recommender {
    /// Items closest to `item_index` in factor space.
    ///
    /// # Returns
    /// * `Ok(Vec<ScoredIndex>)` - Up to `n` items, the query first
    /// * `Err(IndexOutOfRange)` - If `item_index` was never fitted
    fn similar_items(&self, item_index: usize, n: usize) -> Result<Vec<ScoredIndex>>;

    fn similar_users(&self, user_index: usize, n: usize) -> Result<Vec<ScoredIndex>>;

    /// Fitted user factors, one row per user index
    fn user_factors(&self) -> Result<ArrayView2<'_, f32>>;

    /// Fitted item factors, one row per item index
    fn item_factors(&self) -> Result<ArrayView2<'_, f32>>;
}

/// Keep the `n` best scores, skipping `exclude`.
///
/// Ties are broken by ascending index so rankings are reproducible.
pub fn top_n(
    scores: impl IntoIterator<Item = (usize, f32)>,
    n: usize,
    exclude: &[usize],
) -> Vec<ScoredIndex> {
    let mut ranked: Vec<ScoredIndex> = scores
        .into_iter()
        .filter(|(index, score)| !score.is_nan() && !exclude.contains(index))
        .map(|(index, score)| ScoredIndex::new(index, score))
        .collect();

    let by_rank = |a: &ScoredIndex, b: &ScoredIndex| -> Ordering {
        b.score.total_cmp(&a.score).then(a.index.cmp(&b.index))
    };

    if n == 0 {
        return Vec::new();
    }
    if ranked.len() > n {
        ranked.select_nth_unstable_by(n - 1, by_rank);
        ranked.truncate(n);
    }
    ranked.sort_unstable_by(by_rank);
    ranked
}
