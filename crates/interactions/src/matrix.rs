//! User–item interaction matrix construction.
//!
//! Records are grouped by (user, item) and reduced to one value per pair
//! according to a [`ValueMode`]. The result is stored compressed by row
//! (CSR, via `sprs`) with rows ordered by user index and columns by item index, as
//! assigned by the [`IndexMapper`] built alongside it.

use crate::error::{RecError, Result};
use crate::index::IndexMapper;
use crate::types::{InteractionRecord, SparseRow};
use crate::weighting::Weighting;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// How the records of one (user, item) pair become a matrix value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Number of records for the pair
    #[default]
    #[serde(alias = "binary")]
    PresenceCount,
    /// Sum of purchased quantity
    #[serde(alias = "quantity")]
    RawQuantity,
    /// Sum of monetary amount
    #[serde(alias = "purchase_sum")]
    MonetarySum,
}

impl ValueMode {
    fn value_of(self, record: &InteractionRecord) -> f32 {
        match self {
            ValueMode::PresenceCount => 1.0,
            ValueMode::RawQuantity => record.quantity,
            ValueMode::MonetarySum => record.monetary_amount,
        }
    }
}

impl FromStr for ValueMode {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "presence_count" | "binary" => Ok(ValueMode::PresenceCount),
            "raw_quantity" | "quantity" => Ok(ValueMode::RawQuantity),
            "monetary_sum" | "purchase_sum" => Ok(ValueMode::MonetarySum),
            _ => Err(RecError::InvalidValueMode(s.to_string())),
        }
    }
}

impl fmt::Display for ValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ValueMode::PresenceCount => "presence_count",
            ValueMode::RawQuantity => "raw_quantity",
            ValueMode::MonetarySum => "monetary_sum",
        };
        f.write_str(tag)
    }
}

// =============================================================================
// InteractionMatrix
// =============================================================================

/// Compressed sparse row matrix of `f32` interaction values.
///
/// Backed by a [`sprs::CsMat`]. Absent pairs read as zero and only nonzero
/// cells are stored; column indices within a row are sorted.
///
/// ## Rust concept: newtype wrappers
/// Wrapping the `sprs` matrix keeps its index/pointer types out of the
/// public API: models only ever see [`SparseRow`] slices and plain `usize`
/// positions.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    inner: CsMat<f32>,
}

impl InteractionMatrix {
    /// Build from `(row, col, value)` triplets.
    ///
    /// Duplicates are summed, and cells whose sum is exactly zero (returns
    /// cancelling purchases, missing amounts) are not stored.
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f32)>,
    ) -> Self {
        let mut raw = TriMat::new((n_rows, n_cols));
        for (row, col, value) in triplets {
            raw.add_triplet(row, col, value);
        }
        let summed: CsMat<f32> = raw.to_csr();

        let mut kept = TriMat::with_capacity((n_rows, n_cols), summed.nnz());
        for (&value, (row, col)) in summed.iter() {
            if value != 0.0 {
                kept.add_triplet(row, col, value);
            }
        }

        Self {
            inner: kept.to_csr(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.inner.rows()
    }

    pub fn n_cols(&self) -> usize {
        self.inner.cols()
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    /// Stored entries of a row; rows past the end read as empty
    pub fn row(&self, row: usize) -> SparseRow<'_> {
        if row >= self.n_rows() {
            return SparseRow::empty();
        }
        let range = self.inner.indptr().outer_inds_sz(row);
        SparseRow {
            indices: &self.inner.indices()[range.clone()],
            values: &self.inner.data()[range],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        if row >= self.n_rows() || col >= self.n_cols() {
            return 0.0;
        }
        self.inner.get(row, col).copied().unwrap_or(0.0)
    }

    /// Iterate `(row, col, value)` over stored entries in row order
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.inner.iter().map(|(&value, (row, col))| (row, col, value))
    }

    /// Rewrite every stored value from its `(row, col, value)`.
    ///
    /// The sparsity pattern is kept as is, even where `f` returns zero.
    pub fn map_values<F>(&mut self, f: F)
    where
        F: Fn(usize, usize, f32) -> f32 + Sync,
    {
        let positions: Vec<(usize, usize)> = self.entries().map(|(row, col, _)| (row, col)).collect();

        self.inner
            .data_mut()
            .par_iter_mut()
            .zip(positions.par_iter())
            .for_each(|(value, &(row, col))| *value = f(row, col, *value));
    }

    /// Sum of stored values per column
    pub fn col_sums(&self) -> Vec<f32> {
        let mut sums = vec![0.0; self.n_cols()];
        for (&value, (_, col)) in self.inner.iter() {
            sums[col] += value;
        }
        sums
    }

    /// Number of stored entries per row
    pub fn row_nnz(&self) -> Vec<usize> {
        (0..self.n_rows()).map(|row| self.row(row).len()).collect()
    }

    /// Item-major view of the same data
    pub fn transpose(&self) -> Self {
        Self {
            inner: self.inner.transpose_view().to_csr(),
        }
    }
}

// =============================================================================
// MatrixBuilder
// =============================================================================

/// Aggregates interaction records into an [`InteractionMatrix`].
///
/// ## Usage
/// ```ignore
/// let (index, matrix) = MatrixBuilder::new(ValueMode::RawQuantity)
///     .with_weighting(Weighting::bm25())
///     .build(&records);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    value_mode: ValueMode,
    weighting: Weighting,
}

impl MatrixBuilder {
    pub fn new(value_mode: ValueMode) -> Self {
        Self {
            value_mode,
            weighting: Weighting::None,
        }
    }

    /// Configure the column weighting applied after aggregation (default: none)
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Build the index mapping and the (optionally weighted) matrix.
    #[instrument(skip(self, records), fields(records = records.len(), mode = %self.value_mode))]
    pub fn build(&self, records: &[InteractionRecord]) -> (IndexMapper, InteractionMatrix) {
        let index = IndexMapper::from_ids(
            records.iter().map(|r| r.user_id),
            records.iter().map(|r| r.item_id),
        );

        // Every record's ids were just indexed, so the lookups cannot fail
        let triplets = records.iter().filter_map(|record| {
            let row = index.user_index(record.user_id).ok()?;
            let col = index.item_index(record.item_id).ok()?;
            Some((row, col, self.value_mode.value_of(record)))
        });
        let matrix = InteractionMatrix::from_triplets(index.n_users(), index.n_items(), triplets);

        info!(
            "Built {}x{} interaction matrix with {} entries",
            matrix.n_rows(),
            matrix.n_cols(),
            matrix.nnz()
        );

        let matrix = self.weighting.apply(matrix);
        debug!("Applied {} weighting", self.weighting);

        (index, matrix)
    }
}
