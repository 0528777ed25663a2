//! # Engine Crate
//!
//! Combines the latent-factor and co-occurrence models into four
//! recommendation strategies that always return exactly N item ids.
//!
//! ## Main Components
//!
//! - **config**: `EngineConfig` with defaults, builders and JSON loading
//! - **popularity**: Global popularity ranking (fallback) and per-user top purchases
//! - **strategy**: The `rec` / `own` / `itm` / `usr` strategy tags
//! - **engine**: `RecommendationEngine`, the orchestration layer
//!
//! ## Example Usage
//!
//! ```ignore
//! use engine::{EngineConfig, RecommendationEngine, Strategy};
//!
//! let mut engine = RecommendationEngine::new(&records, EngineConfig::default())?;
//! let recs = engine.run(Strategy::SimilarItems, 2375, 5)?;
//! assert_eq!(recs.len(), 5);
//! ```

pub mod config;
pub mod popularity;
pub mod strategy;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{FactorRow, RecommendationEngine};
pub use popularity::{PopularityRanking, UserPurchases};
pub use strategy::Strategy;
