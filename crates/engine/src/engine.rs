//! # Recommendation Engine
//!
//! Owns the indexed interaction matrix, both fitted models and the
//! popularity rankings, and turns them into fixed-length id lists:
//!
//! 1. Map the user id to its matrix row (registering unseen users)
//! 2. Ask the strategy's model for ranked indices
//! 3. Map indices back to item ids, never emitting the placeholder
//! 4. Pad with popular items until the list holds exactly N ids
//!
//! ## Learning Goals
//!
//! - Trait objects as injectable collaborators (`with_models`)
//! - Splitting `&mut self` registration from a `&self` read path so the
//!   evaluator can fan users out with rayon
//! - Enforcing a postcondition with a typed error instead of a panic

use crate::config::EngineConfig;
use crate::popularity::{PopularityRanking, UserPurchases};
use crate::strategy::Strategy;
use interactions::{
    IndexMapper, InteractionMatrix, InteractionRecord, ItemId, MatrixBuilder, Result, UserId,
};
use models::{Recommender, SimilarityModel, build_factorization, build_neighborhood};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Latent vector of one user or item, keyed by its external id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorRow {
    pub id: u64,
    pub factors: Vec<f32>,
}

pub struct RecommendationEngine {
    config: EngineConfig,
    index: IndexMapper,
    matrix: InteractionMatrix,
    popularity: PopularityRanking,
    purchases: UserPurchases,
    /// Column of the placeholder item, if it occurs in the data
    placeholder_index: Option<usize>,
    /// Rust concept: `Box<dyn Trait>` is a trait object. The concrete model
    /// is picked at runtime from the config and called through a vtable.
    factorization: Box<dyn SimilarityModel>,
    neighborhood: Box<dyn Recommender>,
}

impl RecommendationEngine {
    /// Build the matrix and fit the models selected by `config`.
    pub fn new(records: &[InteractionRecord], config: EngineConfig) -> Result<Self> {
        let factorization =
            build_factorization(config.factorization, config.factorization_params.clone());
        let neighborhood =
            build_neighborhood(config.neighborhood, config.neighborhood_params.clone());
        Self::with_models(records, config, factorization, neighborhood)
    }

    /// Build the matrix and fit caller-supplied models on it.
    ///
    /// `config.factorization` and `config.neighborhood` are ignored; every
    /// other field applies.
    #[instrument(skip_all, fields(records = records.len(), factorization = factorization.name(), neighborhood = neighborhood.name()))]
    pub fn with_models(
        records: &[InteractionRecord],
        config: EngineConfig,
        mut factorization: Box<dyn SimilarityModel>,
        mut neighborhood: Box<dyn Recommender>,
    ) -> Result<Self> {
        let (index, matrix) = MatrixBuilder::new(config.value_mode)
            .with_weighting(config.weighting)
            .build(records);

        let popularity = PopularityRanking::from_records(records, config.placeholder_item);
        let purchases = UserPurchases::from_records(records, config.placeholder_item);
        let placeholder_index = index.item_index(config.placeholder_item).ok();

        factorization.fit(&matrix)?;
        neighborhood.fit(&matrix)?;

        info!(
            "Engine ready: {} users, {} items, {} popular fallback items",
            index.n_users(),
            index.n_items(),
            popularity.len()
        );

        Ok(Self {
            config,
            index,
            matrix,
            popularity,
            purchases,
            placeholder_index,
            factorization,
            neighborhood,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &IndexMapper {
        &self.index
    }

    /// The weighted matrix both models were fitted on
    pub fn matrix(&self) -> &InteractionMatrix {
        &self.matrix
    }

    pub fn popularity(&self) -> &PopularityRanking {
        &self.popularity
    }

    pub fn purchases(&self) -> &UserPurchases {
        &self.purchases
    }

    /// Make sure every id has a row index before read-only access.
    pub fn register_users(&mut self, user_ids: impl IntoIterator<Item = UserId>) {
        for user_id in user_ids {
            self.index.register_user(user_id);
        }
    }

    /// Latent-factor recommendations
    pub fn recommend(&mut self, user_id: UserId, n: usize) -> Result<Vec<ItemId>> {
        self.run(Strategy::Factorization, user_id, n)
    }

    /// Co-occurrence recommendations drawn from the user's own purchases
    pub fn recommend_own(&mut self, user_id: UserId, n: usize) -> Result<Vec<ItemId>> {
        self.run(Strategy::Own, user_id, n)
    }

    /// Closest item to each of the user's top-N purchases
    pub fn recommend_similar_items(&mut self, user_id: UserId, n: usize) -> Result<Vec<ItemId>> {
        self.run(Strategy::SimilarItems, user_id, n)
    }

    /// One own-purchase pick from each of the user's N nearest neighbours
    pub fn recommend_similar_users(&mut self, user_id: UserId, n: usize) -> Result<Vec<ItemId>> {
        self.run(Strategy::SimilarUsers, user_id, n)
    }

    /// Register the user, then produce exactly `n` ids with `strategy`.
    pub fn run(&mut self, strategy: Strategy, user_id: UserId, n: usize) -> Result<Vec<ItemId>> {
        self.index.register_user(user_id);
        self.run_registered(strategy, user_id, n)
    }

    /// Read-only variant of [`run`](Self::run).
    ///
    /// The user must already be registered; an unseen id is
    /// [`UnknownUser`](interactions::RecError::UnknownUser) for every
    /// strategy that needs a matrix row.
    #[instrument(level = "debug", skip(self))]
    pub fn run_registered(
        &self,
        strategy: Strategy,
        user_id: UserId,
        n: usize,
    ) -> Result<Vec<ItemId>> {
        let recommendations = match strategy {
            Strategy::Factorization => {
                self.model_recommendations(self.factorization.as_ref(), user_id, n)
            }
            Strategy::Own => self.model_recommendations(self.neighborhood.as_ref(), user_id, n),
            Strategy::SimilarItems => self.similar_item_recommendations(user_id, n),
            Strategy::SimilarUsers => self.similar_user_recommendations(user_id, n),
        }?;
        debug!("{} produced {:?}", strategy, recommendations);
        Ok(recommendations)
    }

    /// Fitted user factors with their user ids
    pub fn user_factor_table(&self) -> Result<Vec<FactorRow>> {
        let factors = self.factorization.user_factors()?;
        factors
            .outer_iter()
            .enumerate()
            .map(|(row, vector)| {
                Ok(FactorRow {
                    id: self.index.user_id(row)?,
                    factors: vector.to_vec(),
                })
            })
            .collect()
    }

    /// Fitted item factors with their item ids
    pub fn item_factor_table(&self) -> Result<Vec<FactorRow>> {
        let factors = self.factorization.item_factors()?;
        factors
            .outer_iter()
            .enumerate()
            .map(|(row, vector)| {
                Ok(FactorRow {
                    id: self.index.item_id(row)?,
                    factors: vector.to_vec(),
                })
            })
            .collect()
    }

    fn model_recommendations<M: Recommender + ?Sized>(
        &self,
        model: &M,
        user_id: UserId,
        n: usize,
    ) -> Result<Vec<ItemId>> {
        let user_index = self.index.user_index(user_id)?;
        let exclude: Vec<usize> = self.placeholder_index.into_iter().collect();

        let scored = model.recommend(user_index, self.matrix.row(user_index), n, &exclude)?;
        let raw = scored
            .iter()
            .map(|s| self.index.item_id(s.index))
            .collect::<Result<Vec<_>>>()?;

        self.popularity.extend_with_popular(raw, n)
    }

    fn similar_item_recommendations(&self, user_id: UserId, n: usize) -> Result<Vec<ItemId>> {
        let mut raw = Vec::with_capacity(n);

        for &item_id in self.purchases.top(user_id, n) {
            let item_index = self.index.item_index(item_id)?;
            // The model lists the query item first, so ask for one more
            let similar = self.factorization.similar_items(item_index, 2)?;
            let neighbor = similar
                .iter()
                .find(|s| s.index != item_index)
                .filter(|s| Some(s.index) != self.placeholder_index);
            if let Some(neighbor) = neighbor {
                raw.push(self.index.item_id(neighbor.index)?);
            }
        }

        self.popularity.extend_with_popular(raw, n)
    }

    fn similar_user_recommendations(&self, user_id: UserId, n: usize) -> Result<Vec<ItemId>> {
        let user_index = self.index.user_index(user_id)?;
        let neighbors = self.factorization.similar_users(user_index, n + 1)?;

        let mut raw = Vec::with_capacity(n);
        for neighbor in neighbors.iter().filter(|s| s.index != user_index).take(n) {
            let neighbor_id = self.index.user_id(neighbor.index)?;
            raw.extend(self.model_recommendations(self.neighborhood.as_ref(), neighbor_id, 1)?);
        }

        self.popularity.extend_with_popular(raw, n)
    }
}
