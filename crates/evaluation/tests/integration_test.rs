//! Integration tests for offline evaluation.
//!
//! Fit a real engine on a small purchase log and check the evaluator's
//! averaging, registration and re-ranking behaviour end to end.

use engine::{EngineConfig, RecommendationEngine, Strategy};
use evaluation::metrics::{PrecisionAtK, RecallAtK};
use evaluation::{Evaluator, ExternalScore, Metric, MetricKind, RERANK_DEPTH};
use interactions::{DEFAULT_PLACEHOLDER_ITEM, InteractionRecord};
use models::{FactorizationKind, FactorizationParams};

fn train() -> Vec<InteractionRecord> {
    let mut records = Vec::new();
    for user in 1..=12u64 {
        let base = if user % 2 == 0 { 10 } else { 50 };
        for offset in 0..4 {
            records.push(InteractionRecord::new(user, base + offset, 1.0, 4.0));
        }
        records.push(InteractionRecord::unit(user, base));
        if user % 4 == 0 {
            records.push(InteractionRecord::unit(user, DEFAULT_PLACEHOLDER_ITEM));
        }
    }
    records
}

fn held_out() -> Vec<InteractionRecord> {
    vec![
        InteractionRecord::unit(2, 10),
        InteractionRecord::unit(2, 11),
        InteractionRecord::unit(3, 50),
        InteractionRecord::unit(3, DEFAULT_PLACEHOLDER_ITEM),
        InteractionRecord::unit(99, 12),
    ]
}

fn engine() -> RecommendationEngine {
    let config = EngineConfig::default().with_factorization(
        FactorizationKind::Als,
        FactorizationParams::default()
            .with_factors(4)
            .with_iterations(5)
            .with_num_threads(2),
    );
    RecommendationEngine::new(&train(), config).unwrap()
}

#[test]
fn test_metric_scenario() {
    let recommended = [10, 20, 99, 50, 60];
    let actual = [10, 20, 30];

    assert!((PrecisionAtK.score(&recommended, &actual, 5) - 0.4).abs() < 1e-12);
    assert!((RecallAtK.score(&recommended, &actual, 5) - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_every_strategy_and_metric_is_a_fraction() {
    let mut engine = engine();
    let held_out = held_out();
    let mut evaluator = Evaluator::new(&mut engine);

    for strategy in Strategy::ALL {
        for kind in MetricKind::ALL {
            let value = evaluator
                .evaluate(strategy, kind.build().as_ref(), &held_out, 3)
                .unwrap();
            assert!((0.0..=1.0).contains(&value), "{strategy}/{kind}: {value}");
        }
    }

    // The held-out-only user was registered along the way
    assert!(engine.index().contains_user(99));
}

#[test]
fn test_tagged_evaluation_matches_typed() {
    let held_out = held_out();

    let mut engine = engine();
    let typed = Evaluator::new(&mut engine)
        .evaluate(Strategy::Own, &RecallAtK, &held_out, 4)
        .unwrap();
    let tagged = Evaluator::new(&mut engine)
        .evaluate_tagged("own", "recall", &held_out, 4)
        .unwrap();

    assert!((typed - tagged).abs() < 1e-12);
}

#[test]
fn test_rerank_depth_is_fixed() {
    let mut engine = engine();
    let held_out = held_out();
    let scores: Vec<ExternalScore> = (0..20)
        .map(|i| ExternalScore::new(2, 100 + i, f64::from(i as u32)))
        .chain([ExternalScore::new(2, 10, 100.0), ExternalScore::new(3, 50, 1.0)])
        .collect();

    let report = Evaluator::new(&mut engine)
        .rerank_tagged("rec", "precision", &held_out, &scores, 7)
        .unwrap();

    let users: Vec<u64> = report.rows.iter().map(|row| row.user_id).collect();
    assert_eq!(users, vec![2, 3, 99]);

    let user_2 = &report.rows[0];
    assert_eq!(user_2.items.len(), RERANK_DEPTH);
    assert_eq!(user_2.items[0], 10);
    assert_eq!(user_2.candidates.len(), 7);

    assert_eq!(report.rows[1].items, vec![50]);
    assert!(report.rows[2].items.is_empty());

    // One hit each for users 2 and 3, scored against k = 7
    let expected = (1.0 / 7.0 + 1.0 / 7.0) / 3.0;
    assert!((report.metric - expected).abs() < 1e-12);
}

#[test]
fn test_rerank_report_serializes() {
    let mut engine = engine();
    let report = Evaluator::new(&mut engine)
        .rerank(
            Strategy::SimilarItems,
            &PrecisionAtK,
            &held_out(),
            &[ExternalScore::new(3, 51, 0.3)],
            2,
        )
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rows"][1]["user_id"], 3);
    assert_eq!(json["rows"][1]["items"][0], 51);
}
