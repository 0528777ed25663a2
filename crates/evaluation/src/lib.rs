//! # Evaluation Crate
//!
//! Offline quality measurement for the recommendation strategies.
//!
//! ## Main Components
//!
//! - **ground_truth**: Held-out records grouped into per-user item lists
//! - **traits**: The `Metric` contract
//! - **metrics**: precision@k, recall@k, hit-rate@k and NDCG@k
//! - **evaluator**: Strategy evaluation and the external re-ranking path
//!
//! ## Example Usage
//!
//! ```ignore
//! use evaluation::{Evaluator, metrics::RecallAtK};
//!
//! let mut evaluator = Evaluator::new(&mut engine);
//! let recall = evaluator.evaluate(Strategy::Own, &RecallAtK, &held_out, 5)?;
//! ```

pub mod ground_truth;
pub mod traits;
pub mod metrics;
pub mod evaluator;

pub use evaluator::{Evaluator, ExternalScore, RERANK_DEPTH, RerankReport, RerankedRow};
pub use ground_truth::{GroundTruth, ground_truth};
pub use metrics::MetricKind;
pub use traits::Metric;
