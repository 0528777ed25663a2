//! Scoring over fitted latent factors, shared by ALS and BPR.

use crate::traits::{ScoredIndex, top_n};
use interactions::{RecError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Fitted user and item factor matrices.
///
/// Row `u` of `user_factors` is the vector of user index `u`; likewise for
/// items. Users registered after fitting have no row and are treated as
/// cold: no recommendations, no neighbours besides themselves.
#[derive(Debug, Clone)]
pub struct FactorModel {
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
}

impl FactorModel {
    pub fn new(user_factors: Array2<f32>, item_factors: Array2<f32>) -> Self {
        debug_assert_eq!(user_factors.ncols(), item_factors.ncols());
        Self {
            user_factors,
            item_factors,
        }
    }

    pub fn user_factors(&self) -> ArrayView2<'_, f32> {
        self.user_factors.view()
    }

    pub fn item_factors(&self) -> ArrayView2<'_, f32> {
        self.item_factors.view()
    }

    /// Rank items by `user · item` for a fitted user
    pub fn recommend(&self, user_index: usize, n: usize, exclude: &[usize]) -> Vec<ScoredIndex> {
        if user_index >= self.user_factors.nrows() {
            return Vec::new();
        }
        let user = self.user_factors.row(user_index);
        let scores = self.item_factors.dot(&user);
        top_n(scores.iter().copied().enumerate(), n, exclude)
    }

    pub fn similar_items(&self, item_index: usize, n: usize) -> Result<Vec<ScoredIndex>> {
        if item_index >= self.item_factors.nrows() {
            return Err(RecError::IndexOutOfRange {
                kind: "item",
                index: item_index,
            });
        }
        Ok(similar_rows(&self.item_factors, item_index, n))
    }

    pub fn similar_users(&self, user_index: usize, n: usize) -> Vec<ScoredIndex> {
        if user_index >= self.user_factors.nrows() {
            // Cold user: only the self match is known
            return if n == 0 {
                Vec::new()
            } else {
                vec![ScoredIndex::new(user_index, 1.0)]
            };
        }
        similar_rows(&self.user_factors, user_index, n)
    }
}

/// Cosine neighbours of one row, with the row itself first.
fn similar_rows(factors: &Array2<f32>, query: usize, n: usize) -> Vec<ScoredIndex> {
    if n == 0 {
        return Vec::new();
    }
    let norms: Array1<f32> = factors.map_axis(Axis(1), |row| row.dot(&row).sqrt());
    let query_vec = factors.row(query);
    let query_norm = norms[query];
    let dots = factors.dot(&query_vec);

    let scores = dots.iter().zip(norms.iter()).enumerate().map(|(idx, (&dot, &norm))| {
        let denom = norm * query_norm;
        let cosine = if denom > 0.0 { dot / denom } else { 0.0 };
        (idx, cosine)
    });

    let mut similar = Vec::with_capacity(n);
    similar.push(ScoredIndex::new(query, 1.0));
    similar.extend(top_n(scores, n - 1, &[query]));
    similar
}
