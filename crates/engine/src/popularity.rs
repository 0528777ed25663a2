//! Purchase-count rankings computed once from the full record set.
//!
//! `PopularityRanking` is the global fallback source; `UserPurchases` feeds
//! the similar-items strategy. Both count records (not quantities) and never
//! contain the placeholder item.

use interactions::{InteractionRecord, ItemId, RecError, Result, UserId};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Item ids by total record count, most popular first.
///
/// Ties are broken by ascending item id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopularityRanking {
    items: Vec<ItemId>,
}

impl PopularityRanking {
    pub fn from_records(records: &[InteractionRecord], placeholder: ItemId) -> Self {
        let mut counts: HashMap<ItemId, usize> = HashMap::new();
        for record in records.iter().filter(|r| r.item_id != placeholder) {
            *counts.entry(record.item_id).or_insert(0) += 1;
        }

        let mut ranked: Vec<(ItemId, usize)> = counts.into_iter().collect();
        ranked.par_sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        Self {
            items: ranked.into_iter().map(|(item, _)| item).collect(),
        }
    }

    /// Use an already ranked list as-is
    pub fn from_ranked(items: Vec<ItemId>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// The first `n` items (fewer if the catalogue is smaller)
    pub fn top(&self, n: usize) -> &[ItemId] {
        &self.items[..n.min(self.items.len())]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pad a short list with the most popular items.
    ///
    /// If `recommendations` holds fewer than `n` ids, the first `n` popular
    /// ids are appended and the result is cut back to `n`. Entries are not
    /// deduplicated. Anything other than exactly `n` ids afterwards is an
    /// [`RecError::InvariantViolation`].
    pub fn extend_with_popular(
        &self,
        mut recommendations: Vec<ItemId>,
        n: usize,
    ) -> Result<Vec<ItemId>> {
        if recommendations.len() < n {
            debug!(
                "Padding {} recommendations with popular items up to {}",
                recommendations.len(),
                n
            );
            recommendations.extend_from_slice(self.top(n));
            recommendations.truncate(n);
        }

        if recommendations.len() != n {
            return Err(RecError::InvariantViolation {
                expected: n,
                actual: recommendations.len(),
            });
        }
        Ok(recommendations)
    }
}

/// Each user's distinct items by record count, most purchased first.
///
/// Ties keep the order in which the items first appear in the records.
#[derive(Debug, Clone, Default)]
pub struct UserPurchases {
    by_user: HashMap<UserId, Vec<ItemId>>,
}

impl UserPurchases {
    pub fn from_records(records: &[InteractionRecord], placeholder: ItemId) -> Self {
        // (item, count) in first-appearance order per user
        let mut grouped: HashMap<UserId, Vec<(ItemId, usize)>> = HashMap::new();
        let mut slots: HashMap<(UserId, ItemId), usize> = HashMap::new();

        for record in records.iter().filter(|r| r.item_id != placeholder) {
            let items = grouped.entry(record.user_id).or_default();
            let slot = *slots
                .entry((record.user_id, record.item_id))
                .or_insert_with(|| {
                    items.push((record.item_id, 0));
                    items.len() - 1
                });
            items[slot].1 += 1;
        }

        let by_user = grouped
            .into_par_iter()
            .map(|(user, mut items)| {
                // Stable sort keeps first-appearance order among equal counts
                items.sort_by(|a, b| b.1.cmp(&a.1));
                (user, items.into_iter().map(|(item, _)| item).collect())
            })
            .collect();

        Self { by_user }
    }

    /// Up to `n` of the user's most purchased items; empty for unknown users
    pub fn top(&self, user_id: UserId, n: usize) -> &[ItemId] {
        self.by_user
            .get(&user_id)
            .map(|items| &items[..n.min(items.len())])
            .unwrap_or(&[])
    }

    pub fn n_users(&self) -> usize {
        self.by_user.len()
    }
}
