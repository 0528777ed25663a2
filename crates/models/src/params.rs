//! Model families and their hyperparameters.

use interactions::{RecError, Result};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which latent-factor trainer backs the global model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorizationKind {
    /// Alternating least squares on implicit feedback
    #[default]
    Als,
    /// Bayesian personalized ranking
    Bpr,
}

impl FromStr for FactorizationKind {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "als" => Ok(FactorizationKind::Als),
            "bpr" => Ok(FactorizationKind::Bpr),
            _ => Err(RecError::UnrecognizedModel(s.to_string())),
        }
    }
}

impl fmt::Display for FactorizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorizationKind::Als => f.write_str("als"),
            FactorizationKind::Bpr => f.write_str("bpr"),
        }
    }
}

/// How item–item similarities are computed for the personal model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborhoodKind {
    /// Raw co-occurrence counts (`XᵀX`)
    #[default]
    ItemItem,
    /// Co-occurrence normalized by item vector norms
    Cosine,
    /// Co-occurrence over a TF-IDF weighted matrix
    #[serde(rename = "tfidf", alias = "tf-idf")]
    TfIdf,
}

impl FromStr for NeighborhoodKind {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "item-item" => Ok(NeighborhoodKind::ItemItem),
            "cosine" => Ok(NeighborhoodKind::Cosine),
            "tfidf" | "tf-idf" => Ok(NeighborhoodKind::TfIdf),
            _ => Err(RecError::UnrecognizedModel(s.to_string())),
        }
    }
}

impl fmt::Display for NeighborhoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighborhoodKind::ItemItem => f.write_str("item-item"),
            NeighborhoodKind::Cosine => f.write_str("cosine"),
            NeighborhoodKind::TfIdf => f.write_str("tfidf"),
        }
    }
}

/// Hyperparameters for the latent-factor models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorizationParams {
    /// Latent dimensionality
    pub factors: usize,
    pub regularization: f32,
    pub iterations: usize,
    /// Worker threads used while fitting
    pub num_threads: usize,
    pub random_seed: u64,
    /// SGD step size (BPR only)
    pub learning_rate: f32,
}

impl Default for FactorizationParams {
    fn default() -> Self {
        Self {
            factors: 20,
            regularization: 0.001,
            iterations: 15,
            num_threads: 4,
            random_seed: 0,
            learning_rate: 0.01,
        }
    }
}

impl FactorizationParams {
    pub fn with_factors(mut self, factors: usize) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_regularization(mut self, regularization: f32) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }
}

/// Hyperparameters for the neighbourhood (co-occurrence) model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodParams {
    /// Neighbours kept per item, the item itself included
    pub k: usize,
    pub num_threads: usize,
}

impl Default for NeighborhoodParams {
    fn default() -> Self {
        Self { k: 1, num_threads: 4 }
    }
}

impl NeighborhoodParams {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }
}

/// Dedicated pool so `num_threads` bounds fitting regardless of the global pool
pub(crate) fn thread_pool(num_threads: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| RecError::InvalidConfig(format!("cannot build thread pool: {e}")))
}
