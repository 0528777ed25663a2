//! Error types shared by every crate in the workspace.
//!
//! Construction-time problems (bad tags, bad config) and call-time problems
//! (unknown ids, unfitted models, broken postconditions) all surface as a
//! [`RecError`] so callers can match on the exact failure.

use thiserror::Error;

/// Errors raised while building matrices, fitting models or producing
/// recommendations.
///
/// Rust concept: `#[derive(Error)]` from thiserror writes the `Display` and
/// `std::error::Error` impls from the `#[error(...)]` attributes, so each
/// variant carries its own message. `Clone + PartialEq` let tests compare
/// whole `Result`s with `assert_eq!`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecError {
    /// Matrix value semantic tag was not recognized
    #[error("Invalid matrix value mode: {0}")]
    InvalidValueMode(String),

    /// Weighting tag was not recognized
    #[error("Invalid weighting: {0}")]
    InvalidWeighting(String),

    /// Model family tag was not recognized
    #[error("Unrecognized model type: {0}")]
    UnrecognizedModel(String),

    /// Item id was never seen when the matrix was built
    #[error("Unknown item id: {0}")]
    UnknownItem(u64),

    /// User id has not been registered
    #[error("Unknown user id: {0}")]
    UnknownUser(u64),

    /// Dense index has no id assigned to it
    #[error("No {kind} assigned to index {index}")]
    IndexOutOfRange { kind: &'static str, index: usize },

    /// Recommend/similarity call issued before `fit` completed
    #[error("Model {0} has not been fitted")]
    ModelNotFitted(String),

    /// A strategy returned a list whose length differs from the request.
    ///
    /// Fallback always pads to N when the popularity ranking is large
    /// enough, so this means the catalogue is smaller than N.
    #[error("Expected {expected} recommendations but produced {actual}")]
    InvariantViolation { expected: usize, actual: usize },

    /// Strategy tag was not recognized
    #[error("Unrecognized recommendation strategy: {0}")]
    UnrecognizedStrategy(String),

    /// Metric tag was not recognized
    #[error("Unrecognized metric: {0}")]
    UnrecognizedMetric(String),

    /// Linear solve inside a factorization model failed
    #[error("Solver failed: {0}")]
    Solver(String),

    /// Engine configuration could not be parsed or is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for Results across the workspace
///
/// Rust concept: every crate re-exports this alias, so `?` works across
/// crate boundaries without any `From` conversions.
pub type Result<T> = std::result::Result<T, RecError>;
