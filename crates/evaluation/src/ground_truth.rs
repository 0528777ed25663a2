//! Held-out interactions grouped per user.

use interactions::{InteractionRecord, ItemId, UserId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Items one user actually interacted with in the held-out period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundTruth {
    pub user_id: UserId,
    /// Distinct item ids in first-appearance order
    pub actual: Vec<ItemId>,
}

/// One row per distinct user, ascending by user id.
///
/// The placeholder item is dropped from `actual`; a user whose only lines
/// are placeholder lines still gets a row with an empty `actual`.
pub fn ground_truth(records: &[InteractionRecord], placeholder: ItemId) -> Vec<GroundTruth> {
    let mut by_user: BTreeMap<UserId, (Vec<ItemId>, HashSet<ItemId>)> = BTreeMap::new();

    for record in records {
        let (actual, seen) = by_user.entry(record.user_id).or_default();
        if record.item_id != placeholder && seen.insert(record.item_id) {
            actual.push(record.item_id);
        }
    }

    by_user
        .into_iter()
        .map(|(user_id, (actual, _))| GroundTruth { user_id, actual })
        .collect()
}
