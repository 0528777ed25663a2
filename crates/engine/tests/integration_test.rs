//! Integration tests for the engine.
//!
//! These run the real ALS/BPR and neighbourhood models end to end on a
//! small synthetic purchase log and check the guarantees every strategy
//! makes regardless of model quality.

use engine::{EngineConfig, RecommendationEngine, Strategy};
use interactions::{DEFAULT_PLACEHOLDER_ITEM, InteractionRecord, ValueMode, Weighting};
use models::{FactorizationKind, FactorizationParams, NeighborhoodKind, NeighborhoodParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Two shopper groups with disjoint favourite aisles plus some placeholder lines
fn purchase_log() -> Vec<InteractionRecord> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut records = Vec::new();

    for user in 1..=30u64 {
        let aisle = if user <= 15 { 100 } else { 200 };
        for _ in 0..8 {
            let item = aisle + rng.random_range(0..10u64);
            let quantity = rng.random_range(1..4) as f32;
            records.push(InteractionRecord::new(user, item, quantity, quantity * 2.5));
        }
        if user % 3 == 0 {
            records.push(InteractionRecord::unit(user, DEFAULT_PLACEHOLDER_ITEM));
        }
    }
    records
}

fn small_factorization() -> FactorizationParams {
    FactorizationParams::default()
        .with_factors(6)
        .with_iterations(5)
        .with_num_threads(2)
}

fn assert_strategy_contract(engine: &mut RecommendationEngine, users: &[u64], n: usize) {
    for &strategy in &Strategy::ALL {
        for &user in users {
            let recs = engine.run(strategy, user, n).unwrap();
            assert_eq!(recs.len(), n, "{strategy} returned wrong length for user {user}");
            assert!(
                !recs.contains(&DEFAULT_PLACEHOLDER_ITEM),
                "{strategy} leaked the placeholder for user {user}"
            );
        }
    }
}

#[test]
fn test_default_engine_contract() {
    let records = purchase_log();
    let config = EngineConfig::default()
        .with_factorization(FactorizationKind::Als, small_factorization());
    let mut engine = RecommendationEngine::new(&records, config).unwrap();

    let users: Vec<u64> = (1..=30).collect();
    assert_strategy_contract(&mut engine, &users, 5);
}

#[test]
fn test_every_model_combination() {
    let records = purchase_log();

    for factorization in [FactorizationKind::Als, FactorizationKind::Bpr] {
        for neighborhood in [
            NeighborhoodKind::ItemItem,
            NeighborhoodKind::Cosine,
            NeighborhoodKind::TfIdf,
        ] {
            let config = EngineConfig::default()
                .with_factorization(factorization, small_factorization())
                .with_neighborhood(neighborhood, NeighborhoodParams::default().with_num_threads(2));
            let mut engine = RecommendationEngine::new(&records, config).unwrap();
            assert_strategy_contract(&mut engine, &[1, 16, 30], 4);
        }
    }
}

#[test]
fn test_value_modes_and_weightings() {
    let records = purchase_log();

    for value_mode in [
        ValueMode::PresenceCount,
        ValueMode::RawQuantity,
        ValueMode::MonetarySum,
    ] {
        for weighting in [Weighting::None, Weighting::bm25(), Weighting::TfIdf] {
            let config = EngineConfig::default()
                .with_value_mode(value_mode)
                .with_weighting(weighting)
                .with_factorization(FactorizationKind::Als, small_factorization());
            let mut engine = RecommendationEngine::new(&records, config).unwrap();
            assert_strategy_contract(&mut engine, &[2, 17], 3);
        }
    }
}

#[test]
fn test_cold_users_get_popular_items() {
    let records = purchase_log();
    let config = EngineConfig::default()
        .with_factorization(FactorizationKind::Als, small_factorization());
    let mut engine = RecommendationEngine::new(&records, config).unwrap();

    let popular = engine.popularity().top(3).to_vec();
    assert_eq!(engine.recommend(9_000, 3).unwrap(), popular);
    assert_eq!(engine.recommend_own(9_001, 3).unwrap(), popular);
    assert_eq!(engine.recommend_similar_items(9_002, 3).unwrap(), popular);
    assert_eq!(engine.recommend_similar_users(9_003, 3).unwrap(), popular);
}

#[test]
fn test_own_recommendations_come_from_history() {
    let records = purchase_log();
    let config = EngineConfig::default()
        .with_weighting(Weighting::None)
        .with_factorization(FactorizationKind::Als, small_factorization())
        .with_neighborhood(NeighborhoodKind::Cosine, NeighborhoodParams::default());
    let mut engine = RecommendationEngine::new(&records, config).unwrap();

    // With one cosine neighbour each item maps to itself (or to an item with
    // the exact same buyers), so the top two come from the user's history
    for user in 1..=30u64 {
        let bought: Vec<u64> = records
            .iter()
            .filter(|r| r.user_id == user)
            .map(|r| r.item_id)
            .collect();
        let recs = engine.recommend_own(user, 2).unwrap();
        assert!(recs.iter().all(|item| bought.contains(item)), "user {user}: {recs:?}");
    }
}

#[test]
fn test_factor_tables_cover_fitted_ids() {
    let records = purchase_log();
    let config = EngineConfig::default()
        .with_factorization(FactorizationKind::Als, small_factorization());
    let engine = RecommendationEngine::new(&records, config).unwrap();

    let users = engine.user_factor_table().unwrap();
    let items = engine.item_factor_table().unwrap();

    assert_eq!(users.len(), 30);
    assert_eq!(items.len(), engine.index().n_items());
    assert!(users.iter().all(|row| row.factors.len() == 6));
    assert_eq!(users[0].id, 1);
}
