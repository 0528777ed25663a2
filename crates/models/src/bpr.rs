//! Bayesian Personalized Ranking.
//!
//! Learns factors so that, for each user, items they interacted with score
//! above items they did not. Each epoch draws as many `(user, positive,
//! negative)` triples as there are positive entries and takes one SGD step
//! on `ln σ(xᵤᵢ - xᵤⱼ)` per triple. Sampling is sequential, so a seed fully
//! determines the fitted factors.

use crate::factors::FactorModel;
use crate::params::FactorizationParams;
use crate::traits::{Recommender, ScoredIndex, SimilarityModel};
use interactions::{InteractionMatrix, RecError, Result, SparseRow};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

/// Attempts at drawing an item the user has not interacted with
const NEGATIVE_SAMPLE_ATTEMPTS: usize = 10;

/// BPR latent-factor model
pub struct BayesianPersonalizedRanking {
    params: FactorizationParams,
    model: Option<FactorModel>,
}

impl BayesianPersonalizedRanking {
    pub fn new(params: FactorizationParams) -> Self {
        Self {
            params,
            model: None,
        }
    }

    fn fitted(&self) -> Result<&FactorModel> {
        self.model
            .as_ref()
            .ok_or_else(|| RecError::ModelNotFitted(self.name().to_string()))
    }
}

impl Default for BayesianPersonalizedRanking {
    fn default() -> Self {
        Self::new(FactorizationParams::default())
    }
}

impl Recommender for BayesianPersonalizedRanking {
    fn name(&self) -> &str {
        "bpr"
    }

    #[instrument(skip(self, matrix), fields(users = matrix.n_rows(), items = matrix.n_cols()))]
    fn fit(&mut self, matrix: &InteractionMatrix) -> Result<()> {
        let k = self.params.factors;
        let lr = self.params.learning_rate;
        let reg = self.params.regularization;

        let mut rng = StdRng::seed_from_u64(self.params.random_seed);
        let mut users = centered_factors(&mut rng, matrix.n_rows(), k);
        let mut items = centered_factors(&mut rng, matrix.n_cols(), k);

        let positives: Vec<(usize, usize)> = matrix
            .entries()
            .filter(|&(_, _, value)| value > 0.0)
            .map(|(user, item, _)| (user, item))
            .collect();

        if positives.is_empty() || matrix.n_cols() < 2 {
            warn!("Nothing to rank against, keeping initial factors");
        } else {
            for epoch in 0..self.params.iterations {
                let mut correct = 0usize;
                for _ in 0..positives.len() {
                    let (user, positive) = positives[rng.random_range(0..positives.len())];
                    let Some(negative) = sample_negative(&mut rng, matrix.row(user), matrix.n_cols())
                    else {
                        continue;
                    };
                    if sgd_step(&mut users, &mut items, user, positive, negative, lr, reg) {
                        correct += 1;
                    }
                }
                debug!(
                    "BPR epoch {}: {:.3} of sampled pairs ranked correctly",
                    epoch + 1,
                    correct as f32 / positives.len() as f32
                );
            }
        }

        info!(
            "Fitted BPR with {} factors over {} epochs",
            k, self.params.iterations
        );
        self.model = Some(FactorModel::new(users, items));
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn recommend(
        &self,
        user_index: usize,
        _user_row: SparseRow<'_>,
        n: usize,
        exclude: &[usize],
    ) -> Result<Vec<ScoredIndex>> {
        Ok(self.fitted()?.recommend(user_index, n, exclude))
    }
}

impl SimilarityModel for BayesianPersonalizedRanking {
    fn similar_items(&self, item_index: usize, n: usize) -> Result<Vec<ScoredIndex>> {
        self.fitted()?.similar_items(item_index, n)
    }

    fn similar_users(&self, user_index: usize, n: usize) -> Result<Vec<ScoredIndex>> {
        Ok(self.fitted()?.similar_users(user_index, n))
    }

    fn user_factors(&self) -> Result<ArrayView2<'_, f32>> {
        Ok(self.fitted()?.user_factors())
    }

    fn item_factors(&self) -> Result<ArrayView2<'_, f32>> {
        Ok(self.fitted()?.item_factors())
    }
}

/// Zero-centred initial factors scaled down by the dimensionality
fn centered_factors(rng: &mut StdRng, rows: usize, k: usize) -> Array2<f32> {
    let scale = 1.0 / k.max(1) as f32;
    Array2::from_shape_fn((rows, k), |_| (rng.random::<f32>() - 0.5) * scale)
}

fn sample_negative(rng: &mut StdRng, row: SparseRow<'_>, n_items: usize) -> Option<usize> {
    (0..NEGATIVE_SAMPLE_ATTEMPTS)
        .map(|_| rng.random_range(0..n_items))
        .find(|candidate| row.indices.binary_search(candidate).is_err())
}

/// One gradient step; returns whether the pair was already ranked correctly.
fn sgd_step(
    users: &mut Array2<f32>,
    items: &mut Array2<f32>,
    user: usize,
    positive: usize,
    negative: usize,
    lr: f32,
    reg: f32,
) -> bool {
    let k = users.ncols();
    let u = users.row(user).to_owned();
    let i = items.row(positive).to_owned();
    let j = items.row(negative).to_owned();

    let x_uij = u.dot(&i) - u.dot(&j);
    let z = 1.0 / (1.0 + x_uij.exp());

    for f in 0..k {
        users[[user, f]] += lr * (z * (i[f] - j[f]) - reg * u[f]);
        items[[positive, f]] += lr * (z * u[f] - reg * i[f]);
        items[[negative, f]] += lr * (-z * u[f] - reg * j[f]);
    }

    x_uij > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clustered() -> InteractionMatrix {
        let mut triplets = Vec::new();
        for user in 0..4 {
            for item in 0..4 {
                triplets.push((user, item, 1.0));
            }
        }
        for user in 4..8 {
            for item in 4..8 {
                triplets.push((user, item, 1.0));
            }
        }
        InteractionMatrix::from_triplets(8, 8, triplets)
    }

    fn params() -> FactorizationParams {
        FactorizationParams::default()
            .with_factors(8)
            .with_iterations(200)
            .with_learning_rate(0.05)
            .with_regularization(0.0001)
    }

    #[test]
    fn test_unfitted_model_errors() {
        let model = BayesianPersonalizedRanking::default();
        assert!(matches!(
            model.similar_users(0, 2),
            Err(RecError::ModelNotFitted(_))
        ));
    }

    #[test]
    fn test_positives_outrank_negatives() {
        let matrix = clustered();
        let mut model = BayesianPersonalizedRanking::new(params());
        model.fit(&matrix).unwrap();

        let recs = model.recommend(0, matrix.row(0), 4, &[]).unwrap();
        assert!(recs.iter().all(|s| s.index < 4));

        let recs = model.recommend(6, matrix.row(6), 4, &[]).unwrap();
        assert!(recs.iter().all(|s| s.index >= 4));
    }

    #[test]
    fn test_single_item_catalogue_keeps_initial_factors() {
        let matrix = InteractionMatrix::from_triplets(2, 1, vec![(0, 0, 1.0), (1, 0, 1.0)]);
        let mut model = BayesianPersonalizedRanking::new(params());
        model.fit(&matrix).unwrap();
        assert_eq!(model.item_factors().unwrap().dim(), (1, 8));
    }
}
