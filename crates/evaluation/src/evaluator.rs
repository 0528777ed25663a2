//! # Offline Evaluator
//!
//! Scores a recommendation strategy against held-out purchases:
//!
//! 1. Group the held-out records into per-user ground truth
//! 2. Register every held-out user with the engine
//! 3. Produce each user's N-list in parallel over the read-only engine
//! 4. Average the metric over users with `k = N`
//!
//! The re-ranking path replaces each user's list with the top entries of an
//! externally scored table before scoring it.

use crate::ground_truth::{GroundTruth, ground_truth};
use crate::metrics::MetricKind;
use crate::traits::Metric;
use engine::{RecommendationEngine, Strategy};
use interactions::{InteractionRecord, ItemId, Result, UserId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Number of externally scored items kept per user when re-ranking.
///
/// Independent of the requested list length N.
pub const RERANK_DEPTH: usize = 5;

/// One row of an external scoring table (e.g. a purchase-probability model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalScore {
    pub entity_id: UserId,
    pub item_id: ItemId,
    pub score: f64,
}

impl ExternalScore {
    pub fn new(entity_id: UserId, item_id: ItemId, score: f64) -> Self {
        Self {
            entity_id,
            item_id,
            score,
        }
    }
}

/// A user's base-strategy list next to its re-ranked replacement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerankedRow {
    pub user_id: UserId,
    /// What the base strategy produced
    pub candidates: Vec<ItemId>,
    /// Top externally scored items, best first
    pub items: Vec<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerankReport {
    pub metric: f64,
    pub rows: Vec<RerankedRow>,
}

/// Drives strategy evaluation over one engine.
///
/// Holds the engine mutably because held-out users must be registered
/// before the parallel, read-only scoring pass.
pub struct Evaluator<'a> {
    engine: &'a mut RecommendationEngine,
}

impl<'a> Evaluator<'a> {
    pub fn new(engine: &'a mut RecommendationEngine) -> Self {
        Self { engine }
    }

    /// Mean metric over held-out users; 0.0 when there are none.
    #[instrument(skip(self, metric, held_out), fields(metric = metric.name(), users = tracing::field::Empty))]
    pub fn evaluate(
        &mut self,
        strategy: Strategy,
        metric: &dyn Metric,
        held_out: &[InteractionRecord],
        n: usize,
    ) -> Result<f64> {
        let truth = ground_truth(held_out, self.engine.config().placeholder_item);
        tracing::Span::current().record("users", truth.len());
        if truth.is_empty() {
            warn!("No held-out users, {} is 0", metric.name());
            return Ok(0.0);
        }

        let lists = self.candidates(strategy, &truth, n)?;
        let value = mean_score(metric, &truth, &lists, n);

        info!("{}@{} for {}: {:.4}", metric.name(), n, strategy, value);
        Ok(value)
    }

    /// Score externally re-ranked lists instead of the strategy's own.
    ///
    /// The base strategy still runs for every user (its lists are reported
    /// as `candidates`); the scored lists are each user's
    /// [`RERANK_DEPTH`] best `scores` rows, evaluated with `k = n`.
    #[instrument(skip(self, metric, held_out, scores), fields(metric = metric.name(), scores = scores.len()))]
    pub fn rerank(
        &mut self,
        strategy: Strategy,
        metric: &dyn Metric,
        held_out: &[InteractionRecord],
        scores: &[ExternalScore],
        n: usize,
    ) -> Result<RerankReport> {
        let truth = ground_truth(held_out, self.engine.config().placeholder_item);
        let candidates = self.candidates(strategy, &truth, n)?;

        let mut by_entity: HashMap<UserId, Vec<&ExternalScore>> = HashMap::new();
        for row in scores {
            by_entity.entry(row.entity_id).or_default().push(row);
        }

        let reranked: Vec<Vec<ItemId>> = truth
            .par_iter()
            .map(|row| top_scored(by_entity.get(&row.user_id).map(Vec::as_slice).unwrap_or(&[])))
            .collect();

        let metric_value = if truth.is_empty() {
            0.0
        } else {
            mean_score(metric, &truth, &reranked, n)
        };
        info!(
            "Re-ranked {}@{} for {}: {:.4}",
            metric.name(),
            n,
            strategy,
            metric_value
        );

        let rows = truth
            .iter()
            .zip(candidates)
            .zip(reranked)
            .map(|((row, candidates), items)| RerankedRow {
                user_id: row.user_id,
                candidates,
                items,
            })
            .collect();

        Ok(RerankReport {
            metric: metric_value,
            rows,
        })
    }

    /// [`evaluate`](Self::evaluate) with string tags (`rec`/`own`/`itm`/`usr`, `precision`/`recall`/...)
    pub fn evaluate_tagged(
        &mut self,
        strategy: &str,
        metric: &str,
        held_out: &[InteractionRecord],
        n: usize,
    ) -> Result<f64> {
        let strategy: Strategy = strategy.parse()?;
        let metric = metric.parse::<MetricKind>()?.build();
        self.evaluate(strategy, metric.as_ref(), held_out, n)
    }

    /// [`rerank`](Self::rerank) with string tags
    pub fn rerank_tagged(
        &mut self,
        strategy: &str,
        metric: &str,
        held_out: &[InteractionRecord],
        scores: &[ExternalScore],
        n: usize,
    ) -> Result<RerankReport> {
        let strategy: Strategy = strategy.parse()?;
        let metric = metric.parse::<MetricKind>()?.build();
        self.rerank(strategy, metric.as_ref(), held_out, scores, n)
    }

    /// Register all users, then build their lists in parallel
    fn candidates(
        &mut self,
        strategy: Strategy,
        truth: &[GroundTruth],
        n: usize,
    ) -> Result<Vec<Vec<ItemId>>> {
        self.engine.register_users(truth.iter().map(|row| row.user_id));

        // Reborrow as shared: rayon closures need `&RecommendationEngine: Sync`
        let engine: &RecommendationEngine = &*self.engine;
        truth
            .par_iter()
            .map(|row| engine.run_registered(strategy, row.user_id, n))
            .collect()
    }
}

/// Scores are computed in parallel but summed in user order, so repeated
/// runs give bit-identical means.
fn mean_score(metric: &dyn Metric, truth: &[GroundTruth], lists: &[Vec<ItemId>], k: usize) -> f64 {
    let scores: Vec<f64> = truth
        .par_iter()
        .zip(lists.par_iter())
        .map(|(row, list)| metric.score(list, &row.actual, k))
        .collect();
    scores.iter().sum::<f64>() / truth.len() as f64
}

/// Highest scores first; ties keep table order
fn top_scored(rows: &[&ExternalScore]) -> Vec<ItemId> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
    rows.into_iter()
        .take(RERANK_DEPTH)
        .map(|row| row.item_id)
        .collect()
}
