//! # Interactions Crate
//!
//! This crate turns raw purchase records into the indexed sparse matrix the
//! recommendation models are fitted on.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (InteractionRecord, UserId, ItemId, SparseRow)
//! - **index**: Bidirectional id ↔ matrix index mapping (IndexMapper)
//! - **matrix**: Aggregation of records into a `sprs` CSR matrix (MatrixBuilder)
//! - **weighting**: BM25 and TF-IDF column weighting
//! - **error**: Error type shared by the whole workspace
//!
//! ## Example Usage
//!
//! ```ignore
//! use interactions::{InteractionRecord, MatrixBuilder, ValueMode, Weighting};
//!
//! let records = vec![InteractionRecord::new(1, 100, 2.0, 3.5)];
//! let (index, matrix) = MatrixBuilder::new(ValueMode::PresenceCount)
//!     .with_weighting(Weighting::bm25())
//!     .build(&records);
//!
//! let row = matrix.row(index.user_index(1)?);
//! println!("user 1 interacted with {} items", row.len());
//! ```

pub mod error;
pub mod types;
pub mod index;
pub mod matrix;
pub mod weighting;

// Re-export commonly used types for convenience
pub use error::{RecError, Result};
pub use index::{IdIndex, IndexMapper};
pub use matrix::{InteractionMatrix, MatrixBuilder, ValueMode};
pub use types::{DEFAULT_PLACEHOLDER_ITEM, InteractionRecord, ItemId, SparseRow, UserId};
pub use weighting::Weighting;
