//! Offline evaluation harness.
//!
//! Generates a seeded synthetic purchase log, fits the default engine on the
//! training period and reports every strategy's precision/recall on the
//! held-out period, plus the re-ranking path driven by factor-model scores.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use engine::{EngineConfig, RecommendationEngine, Strategy};
use evaluation::{Evaluator, ExternalScore, MetricKind};
use interactions::{DEFAULT_PLACEHOLDER_ITEM, InteractionRecord};
use models::{FactorizationKind, FactorizationParams};

const USERS: u64 = 300;
const SEGMENTS: u64 = 4;
const ITEMS_PER_SEGMENT: u64 = 25;
const TRAIN_LINES: usize = 24;
const HELD_OUT_LINES: usize = 6;
const N: usize = 5;

/// Shoppers mostly buy from their own segment's aisle, sometimes anywhere
fn purchase_line(rng: &mut StdRng, user: u64) -> InteractionRecord {
    if rng.random_bool(0.05) {
        return InteractionRecord::unit(user, DEFAULT_PLACEHOLDER_ITEM);
    }
    let segment = if rng.random_bool(0.8) {
        user % SEGMENTS
    } else {
        rng.random_range(0..SEGMENTS)
    };
    // Low offsets are the aisle's bestsellers
    let offset = (rng.random::<f64>().powi(2) * ITEMS_PER_SEGMENT as f64) as u64;
    let item = 1_000 + segment * 100 + offset;
    let quantity = rng.random_range(1..=3) as f32;
    let price = rng.random_range(0.5f32..15.0);
    InteractionRecord::new(user, item, quantity, quantity * price)
}

fn synthetic_log(seed: u64) -> (Vec<InteractionRecord>, Vec<InteractionRecord>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut held_out = Vec::new();

    for user in 1..=USERS {
        for _ in 0..TRAIN_LINES {
            train.push(purchase_line(&mut rng, user));
        }
        for _ in 0..HELD_OUT_LINES {
            held_out.push(purchase_line(&mut rng, user));
        }
    }
    // A handful of shoppers only show up in the held-out period
    for user in USERS + 1..=USERS + 10 {
        for _ in 0..HELD_OUT_LINES {
            held_out.push(purchase_line(&mut rng, user));
        }
    }
    (train, held_out)
}

/// Score each held-out user's catalogue with the fitted factors
fn factor_scores(engine: &RecommendationEngine, held_out: &[InteractionRecord]) -> Result<Vec<ExternalScore>> {
    let users: HashMap<u64, Vec<f32>> = engine
        .user_factor_table()?
        .into_iter()
        .map(|row| (row.id, row.factors))
        .collect();
    let items = engine.item_factor_table()?;

    let mut held_out_users: Vec<u64> = held_out.iter().map(|r| r.user_id).collect();
    held_out_users.sort_unstable();
    held_out_users.dedup();

    let mut scores = Vec::new();
    for user_id in held_out_users {
        let Some(user) = users.get(&user_id) else {
            continue;
        };
        for item in items.iter().filter(|row| row.id != DEFAULT_PLACEHOLDER_ITEM) {
            let score: f32 = user.iter().zip(&item.factors).map(|(u, i)| u * i).sum();
            scores.push(ExternalScore::new(user_id, item.id, f64::from(score)));
        }
    }
    Ok(scores)
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (train, held_out) = synthetic_log(2024);
    info!(
        "Generated {} training and {} held-out lines",
        train.len(),
        held_out.len()
    );

    let config = EngineConfig::default().with_factorization(
        FactorizationKind::Als,
        FactorizationParams::default().with_factors(16),
    );

    let start = Instant::now();
    let mut engine =
        RecommendationEngine::new(&train, config).context("Failed to build recommendation engine")?;
    info!("Engine fitted in {:?}", start.elapsed());

    println!("\n{}", format!("Strategy quality @{N}").bold().underline());
    println!("{:<10} {:>10} {:>10} {:>10} {:>10}", "strategy", "precision", "recall", "hit_rate", "ndcg");

    let mut evaluator = Evaluator::new(&mut engine);
    for strategy in Strategy::ALL {
        let mut cells = Vec::new();
        for kind in MetricKind::ALL {
            let metric = kind.build();
            let value = evaluator
                .evaluate(strategy, metric.as_ref(), &held_out, N)
                .with_context(|| format!("Failed to evaluate {strategy} with {kind}"))?;
            cells.push(format!("{value:>10.4}"));
        }
        println!("{:<10} {}", strategy.tag().cyan(), cells.join(" ").green());
    }

    let scores = factor_scores(&engine, &held_out).context("Failed to export factors")?;
    let report = Evaluator::new(&mut engine)
        .rerank(
            Strategy::Factorization,
            MetricKind::Precision.build().as_ref(),
            &held_out,
            &scores,
            N,
        )
        .context("Failed to re-rank")?;

    println!(
        "\n{} {}",
        "Re-ranked precision:".bold(),
        format!("{:.4}", report.metric).yellow()
    );
    let sample = serde_json::to_string_pretty(&report.rows[..report.rows.len().min(3)])
        .context("Failed to serialize re-ranked rows")?;
    println!("{sample}");

    Ok(())
}
