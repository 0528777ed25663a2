//! Alternating Least Squares for implicit feedback.
//!
//! Every stored matrix value `v > 0` is read as a positive preference with
//! confidence `1 + v`; absent pairs are negative with confidence 1. Each
//! sweep fixes one side and solves a ridge system per row of the other:
//!
//! `(YᵀY + Σ (c - 1) y yᵀ + λI) x = Σ c y`
//!
//! Rows are solved in parallel on a pool sized by `num_threads`.

use crate::factors::FactorModel;
use crate::params::{FactorizationParams, thread_pool};
use crate::traits::{Recommender, ScoredIndex, SimilarityModel};
use interactions::{InteractionMatrix, RecError, Result, SparseRow};
use ndarray::{Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

/// ALS latent-factor model
pub struct AlternatingLeastSquares {
    params: FactorizationParams,
    model: Option<FactorModel>,
}

impl AlternatingLeastSquares {
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

impl Default for AlternatingLeastSquares {
    fn default() -> Self {
        Self::new(FactorizationParams::default())
    }
}

impl Recommender for AlternatingLeastSquares {
    fn name(&self) -> &str {
        "als"
    }

    #[instrument(skip(self, matrix), fields(users = matrix.n_rows(), items = matrix.n_cols()))]
    fn fit(&mut self, matrix: &InteractionMatrix) -> Result<()> {
        let k = self.params.factors;
        let regularization = f64::from(self.params.regularization);
        let pool = thread_pool(self.params.num_threads)?;
        let item_major = matrix.transpose();

        let mut rng = StdRng::seed_from_u64(self.params.random_seed);
        let mut user_factors = random_factors(&mut rng, matrix.n_rows(), k);
        let mut item_factors = random_factors(&mut rng, matrix.n_cols(), k);

        // Rust concept: `pool.install` runs the closure inside our own rayon
        // pool, so every `par_iter` it reaches uses `num_threads` workers
        // instead of the global pool
        for iteration in 0..self.params.iterations {
            user_factors = pool.install(|| solve_side(matrix, &item_factors, regularization))?;
            item_factors = pool.install(|| solve_side(&item_major, &user_factors, regularization))?;
            debug!("ALS iteration {} complete", iteration + 1);
        }

        info!(
            "Fitted ALS with {} factors over {} iterations",
            k, self.params.iterations
        );
        self.model = Some(FactorModel::new(user_factors, item_factors));
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

impl SimilarityModel for AlternatingLeastSquares {
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

/// Small positive initial factors, reproducible for a seed
pub(crate) fn random_factors(rng: &mut StdRng, rows: usize, k: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, k), |_| rng.random::<f32>() * 0.01)
}

/// Solve every row of `ratings` against the fixed factors of the other side.
fn solve_side(
    ratings: &InteractionMatrix,
    fixed: &Array2<f32>,
    regularization: f64,
) -> Result<Array2<f32>> {
    let k = fixed.ncols();
    let y = fixed.mapv(f64::from);
    let yty = y.t().dot(&y);

    let rows = (0..ratings.n_rows())
        .into_par_iter()
        .map(|row| solve_row(ratings.row(row), &y, &yty, regularization))
        .collect::<Result<Vec<Array1<f64>>>>()?;

    let flat: Vec<f32> = rows
        .iter()
        .flat_map(|x| x.iter().map(|&v| v as f32))
        .collect();
    Array2::from_shape_vec((ratings.n_rows(), k), flat).map_err(|e| RecError::Solver(e.to_string()))
}

fn solve_row(
    row: SparseRow<'_>,
    y: &Array2<f64>,
    yty: &Array2<f64>,
    regularization: f64,
) -> Result<Array1<f64>> {
    let k = y.ncols();
    let mut a = yty.clone();
    let mut b = Array1::<f64>::zeros(k);

    for (col, value) in row.iter() {
        if value <= 0.0 {
            continue;
        }
        let confidence = 1.0 + f64::from(value);
        let y_i = y.row(col);
        for i in 0..k {
            for j in 0..k {
                a[[i, j]] += (confidence - 1.0) * y_i[i] * y_i[j];
            }
            b[i] += confidence * y_i[i];
        }
    }

    for i in 0..k {
        a[[i, i]] += regularization;
    }

    cholesky_solve(&a, &b)
}

/// Solve `A x = b` for symmetric positive definite `A` via `A = L Lᵀ`.
pub(crate) fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return Err(RecError::Solver("matrix is not positive definite".to_string()));
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L y = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Back substitution: Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Two clusters: users 0-2 buy items 0-2, users 3-5 buy items 3-5
    fn clustered() -> InteractionMatrix {
        let mut triplets = Vec::new();
        for user in 0..3 {
            for item in 0..3 {
                triplets.push((user, item, 1.0));
            }
        }
        for user in 3..6 {
            for item in 3..6 {
                triplets.push((user, item, 1.0));
            }
        }
        InteractionMatrix::from_triplets(6, 6, triplets)
    }

    fn params() -> FactorizationParams {
        FactorizationParams::default()
            .with_factors(4)
            .with_regularization(0.01)
            .with_iterations(10)
            .with_num_threads(2)
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-9);
        assert!(x[1].abs() < 1e-9);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![1.0, 1.0];
        assert!(matches!(cholesky_solve(&a, &b), Err(RecError::Solver(_))));
    }

    #[test]
    fn test_unfitted_model_errors() {
        let model = AlternatingLeastSquares::default();
        assert!(!model.is_fitted());
        assert!(matches!(
            model.recommend(0, SparseRow::empty(), 3, &[]),
            Err(RecError::ModelNotFitted(_))
        ));
        assert!(matches!(
            model.similar_items(0, 2),
            Err(RecError::ModelNotFitted(_))
        ));
        assert!(matches!(model.user_factors(), Err(RecError::ModelNotFitted(_))));
    }

    #[test]
    fn test_fit_shapes() {
        let matrix = clustered();
        let mut model = AlternatingLeastSquares::new(params());
        model.fit(&matrix).unwrap();

        assert!(model.is_fitted());
        assert_eq!(model.user_factors().unwrap().dim(), (6, 4));
        assert_eq!(model.item_factors().unwrap().dim(), (6, 4));
    }

    #[test]
    fn test_recommends_from_own_cluster() {
        let matrix = clustered();
        let mut model = AlternatingLeastSquares::new(params());
        model.fit(&matrix).unwrap();

        let recs = model.recommend(0, matrix.row(0), 3, &[]).unwrap();
        let mut indices: Vec<usize> = recs.iter().map(|s| s.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_similar_items_within_cluster() {
        let matrix = clustered();
        let mut model = AlternatingLeastSquares::new(params());
        model.fit(&matrix).unwrap();

        let similar = model.similar_items(4, 2).unwrap();
        assert_eq!(similar[0].index, 4);
        assert!((3..6).contains(&similar[1].index));

        let neighbours = model.similar_users(1, 3).unwrap();
        assert_eq!(neighbours[0].index, 1);
        assert!(neighbours[1..].iter().all(|s| s.index < 3));
    }

    #[test]
    fn test_fit_is_reproducible_for_a_seed() {
        let matrix = clustered();
        let mut first = AlternatingLeastSquares::new(params());
        let mut second = AlternatingLeastSquares::new(params());
        first.fit(&matrix).unwrap();
        second.fit(&matrix).unwrap();
        assert_eq!(first.item_factors().unwrap(), second.item_factors().unwrap());
    }
}
