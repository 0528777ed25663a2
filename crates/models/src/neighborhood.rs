//! Item–item neighbourhood ("own purchases") recommender.
//!
//! Fitting computes item–item co-occurrence over the users who interacted
//! with both items and keeps the `k` strongest neighbours per item, the item
//! itself included. A user's score for item `j` is `Σ r_ui · W[i, j]` over
//! the user's row, so candidates are always correlated with what the user
//! already bought. With the default `k = 1` the neighbour is almost always
//! the item itself and the model ranks the user's own purchases.

use crate::params::{NeighborhoodKind, NeighborhoodParams, thread_pool};
use crate::traits::{Recommender, ScoredIndex, top_n};
use interactions::weighting::tfidf_weight;
use interactions::{InteractionMatrix, RecError, Result, SparseRow};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Co-occurrence recommender over a user×item matrix
pub struct NeighborhoodRecommender {
    kind: NeighborhoodKind,
    params: NeighborhoodParams,
    /// Strongest neighbours per item index, by descending similarity
    neighbors: Option<Vec<Vec<ScoredIndex>>>,
}

impl NeighborhoodRecommender {
    pub fn new(kind: NeighborhoodKind, params: NeighborhoodParams) -> Self {
        Self {
            kind,
            params,
            neighbors: None,
        }
    }

    pub fn kind(&self) -> NeighborhoodKind {
        self.kind
    }

    /// Neighbours kept for an item after fitting
    pub fn neighbors_of(&self, item_index: usize) -> Result<&[ScoredIndex]> {
        let neighbors = self.fitted()?;
        neighbors
            .get(item_index)
            .map(Vec::as_slice)
            .ok_or(RecError::IndexOutOfRange {
                kind: "item",
                index: item_index,
            })
    }

    fn fitted(&self) -> Result<&Vec<Vec<ScoredIndex>>> {
        self.neighbors
            .as_ref()
            .ok_or_else(|| RecError::ModelNotFitted(self.name().to_string()))
    }
}

impl Default for NeighborhoodRecommender {
    fn default() -> Self {
        Self::new(NeighborhoodKind::default(), NeighborhoodParams::default())
    }
}

impl Recommender for NeighborhoodRecommender {
    fn name(&self) -> &str {
        match self.kind {
            NeighborhoodKind::ItemItem => "item-item",
            NeighborhoodKind::Cosine => "cosine",
            NeighborhoodKind::TfIdf => "tfidf",
        }
    }

    #[instrument(skip(self, matrix), fields(kind = %self.kind, k = self.params.k))]
    fn fit(&mut self, matrix: &InteractionMatrix) -> Result<()> {
        let pool = thread_pool(self.params.num_threads)?;

        let user_major = match self.kind {
            NeighborhoodKind::TfIdf => tfidf_weight(matrix.clone()),
            NeighborhoodKind::ItemItem | NeighborhoodKind::Cosine => matrix.clone(),
        };
        let item_major = user_major.transpose();

        let norms: Option<Vec<f32>> = match self.kind {
            NeighborhoodKind::Cosine => Some(
                (0..item_major.n_rows())
                    .map(|item| item_major.row(item).values.iter().map(|v| v * v).sum::<f32>().sqrt())
                    .collect(),
            ),
            NeighborhoodKind::ItemItem | NeighborhoodKind::TfIdf => None,
        };

        let k = self.params.k;
        let neighbors: Vec<Vec<ScoredIndex>> = pool.install(|| {
            (0..item_major.n_rows())
                .into_par_iter()
                .map(|item| {
                    let mut scores = co_occurrence(&user_major, &item_major, item);
                    if let Some(norms) = &norms {
                        for (other, score) in scores.iter_mut() {
                            let denom = norms[item] * norms[*other];
                            *score = if denom > 0.0 { *score / denom } else { 0.0 };
                        }
                    }
                    top_n(scores, k, &[])
                })
                .collect()
        });

        info!(
            "Fitted {} neighbourhood model over {} items",
            self.kind,
            neighbors.len()
        );
        self.neighbors = Some(neighbors);
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.neighbors.is_some()
    }

    fn recommend(
        &self,
        _user_index: usize,
        user_row: SparseRow<'_>,
        n: usize,
        exclude: &[usize],
    ) -> Result<Vec<ScoredIndex>> {
        let neighbors = self.fitted()?;

        let mut scores: HashMap<usize, f32> = HashMap::new();
        for (item, weight) in user_row.iter() {
            let Some(item_neighbors) = neighbors.get(item) else {
                continue;
            };
            for neighbor in item_neighbors {
                *scores.entry(neighbor.index).or_insert(0.0) += weight * neighbor.score;
            }
        }

        Ok(top_n(
            scores.into_iter().filter(|&(_, score)| score != 0.0),
            n,
            exclude,
        ))
    }
}

/// Dot products of one item column with every item it shares a user with
fn co_occurrence(
    user_major: &InteractionMatrix,
    item_major: &InteractionMatrix,
    item: usize,
) -> HashMap<usize, f32> {
    let mut scores: HashMap<usize, f32> = HashMap::new();
    for (user, r_ui) in item_major.row(item).iter() {
        for (other, r_uj) in user_major.row(user).iter() {
            *scores.entry(other).or_insert(0.0) += r_ui * r_uj;
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    /// user 0: item 0 x3, item 1 x1
    /// user 1: item 1 x2, item 2 x1
    /// user 2: item 0 x1, item 2 x1
    fn matrix() -> InteractionMatrix {
        InteractionMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 3.0),
                (0, 1, 1.0),
                (1, 1, 2.0),
                (1, 2, 1.0),
                (2, 0, 1.0),
                (2, 2, 1.0),
            ],
        )
    }

    #[test]
    fn test_unfitted_recommend_errors() {
        let model = NeighborhoodRecommender::default();
        assert!(matches!(
            model.recommend(0, SparseRow::empty(), 3, &[]),
            Err(RecError::ModelNotFitted(_))
        ));
    }

    #[test]
    fn test_item_item_similarities() {
        let mut model = NeighborhoodRecommender::new(
            NeighborhoodKind::ItemItem,
            NeighborhoodParams::default().with_k(3),
        );
        model.fit(&matrix()).unwrap();

        // W[0,0] = 3*3 + 1*1 = 10, W[0,1] = 3*1 = 3, W[0,2] = 1*1 = 1
        let neighbors = model.neighbors_of(0).unwrap();
        assert_eq!(neighbors[0], ScoredIndex::new(0, 10.0));
        assert_eq!(neighbors[1], ScoredIndex::new(1, 3.0));
        assert_eq!(neighbors[2], ScoredIndex::new(2, 1.0));
    }

    #[test]
    fn test_k1_recommends_own_purchases() {
        let matrix = matrix();
        let mut model = NeighborhoodRecommender::default();
        model.fit(&matrix).unwrap();

        let recs = model.recommend(0, matrix.row(0), 5, &[]).unwrap();
        let indices: Vec<usize> = recs.iter().map(|s| s.index).collect();
        // Only the user's own items score, heaviest purchase first
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_recommend_respects_exclude() {
        let matrix = matrix();
        let mut model = NeighborhoodRecommender::default();
        model.fit(&matrix).unwrap();

        let recs = model.recommend(0, matrix.row(0), 5, &[0]).unwrap();
        let indices: Vec<usize> = recs.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn test_empty_row_recommends_nothing() {
        let mut model = NeighborhoodRecommender::default();
        model.fit(&matrix()).unwrap();
        assert!(model.recommend(7, SparseRow::empty(), 3, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let mut model = NeighborhoodRecommender::new(
            NeighborhoodKind::Cosine,
            NeighborhoodParams::default().with_k(3),
        );
        model.fit(&matrix()).unwrap();

        for item in 0..3 {
            let neighbors = model.neighbors_of(item).unwrap();
            assert_eq!(neighbors[0].index, item);
            assert!((neighbors[0].score - 1.0).abs() < 1e-6);
            assert!(neighbors[1..].iter().all(|n| n.score <= 1.0));
        }
    }

    #[test]
    fn test_tfidf_variant_fits() {
        let mut model = NeighborhoodRecommender::new(
            NeighborhoodKind::TfIdf,
            NeighborhoodParams::default().with_k(2),
        );
        model.fit(&matrix()).unwrap();
        assert!(model.is_fitted());
        assert_eq!(model.name(), "tfidf");
        assert!(model.neighbors_of(3).is_err());
    }
}
