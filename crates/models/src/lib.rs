//! # Models Crate
//!
//! Collaborative-filtering models behind the contracts the engine consumes.
//!
//! ## Main Components
//!
//! - **traits**: `Recommender` and `SimilarityModel`, plus the shared `top_n` ranking
//! - **als**: Implicit-feedback alternating least squares
//! - **bpr**: Bayesian personalized ranking
//! - **neighborhood**: Item–item co-occurrence ("own purchases") model
//! - **params**: Model kinds and typed hyperparameters
//!
//! ## Learning Goals
//!
//! - Trait objects (`Box<dyn SimilarityModel>`) as the seam between engine and models
//! - `ndarray` for dense factor math, hand-rolled CSR for the sparse side
//! - Dedicated rayon pools so `num_threads` is honoured per model

pub mod traits;
pub mod params;
pub mod factors;
pub mod als;
pub mod bpr;
pub mod neighborhood;

pub use als::AlternatingLeastSquares;
pub use bpr::BayesianPersonalizedRanking;
pub use factors::FactorModel;
pub use neighborhood::NeighborhoodRecommender;
pub use params::{FactorizationKind, FactorizationParams, NeighborhoodKind, NeighborhoodParams};
pub use traits::{Recommender, ScoredIndex, SimilarityModel, top_n};

/// Build an unfitted latent-factor model of the given kind
///
/// # Arguments
/// * `kind` - Model family (`als` or `bpr`)
/// * `params` - Hyperparameters shared by both families
///
/// # Returns
/// A boxed model; call `fit` before any query
pub fn build_factorization(
    kind: FactorizationKind,
    params: FactorizationParams,
) -> Box<dyn SimilarityModel> {
    match kind {
        FactorizationKind::Als => Box::new(AlternatingLeastSquares::new(params)),
        FactorizationKind::Bpr => Box::new(BayesianPersonalizedRanking::new(params)),
    }
}

/// Build an unfitted neighbourhood model of the given kind
pub fn build_neighborhood(
    kind: NeighborhoodKind,
    params: NeighborhoodParams,
) -> Box<dyn Recommender> {
    Box::new(NeighborhoodRecommender::new(kind, params))
}
