//! Core domain types for transaction-style interaction data.

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// External identifier of a user (customer)
pub type UserId = u64;

/// External identifier of an item (product)
pub type ItemId = u64;

/// Catch-all product id used by the source data for "no specific item".
///
/// It may occupy a matrix column but never appears in a recommendation list.
pub const DEFAULT_PLACEHOLDER_ITEM: ItemId = 999_999;

// =============================================================================
// Interaction Records
// =============================================================================

/// One purchase line: a user bought `quantity` of an item for
/// `monetary_amount`.
///
/// Records are the source of truth and are never mutated after loading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: f32,
    /// Sales value of the line; absent in some extracts
    #[serde(default)]
    pub monetary_amount: f32,
}

impl InteractionRecord {
    pub fn new(user_id: UserId, item_id: ItemId, quantity: f32, monetary_amount: f32) -> Self {
        Self {
            user_id,
            item_id,
            quantity,
            monetary_amount,
        }
    }

    /// A single unit purchase with no recorded sales value
    pub fn unit(user_id: UserId, item_id: ItemId) -> Self {
        Self::new(user_id, item_id, 1.0, 0.0)
    }
}

/// A row of a compressed matrix: parallel slices of column indices and values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f32],
}

impl<'a> SparseRow<'a> {
    /// A row with no stored entries (used for users unseen at build time)
    pub fn empty() -> Self {
        Self {
            indices: &[],
            values: &[],
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate `(column, value)` pairs
    pub fn iter(self) -> impl Iterator<Item = (usize, f32)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults_monetary_amount() {
        let record: InteractionRecord =
            serde_json::from_str(r#"{"user_id":1,"item_id":2,"quantity":3.0}"#).unwrap();
        assert_eq!(record.monetary_amount, 0.0);
        assert_eq!(record.quantity, 3.0);
    }

    #[test]
    fn test_sparse_row_iter() {
        let indices = [0, 4];
        let values = [1.0, 2.5];
        let row = SparseRow {
            indices: &indices,
            values: &values,
        };
        let pairs: Vec<(usize, f32)> = row.iter().collect();
        assert_eq!(pairs, vec![(0, 1.0), (4, 2.5)]);
        assert!(SparseRow::empty().is_empty());
    }
}
