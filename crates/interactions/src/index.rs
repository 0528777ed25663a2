//! Bidirectional id ↔ dense index mapping.
//!
//! Matrix rows and columns are addressed by contiguous indices starting at 0.
//! `IndexMapper` keeps the translation in both directions for users and items:
//! - each side is a growable array (index → id) plus a hash index (id → index)
//! - items are fixed once the matrix is built
//! - users may grow at inference time through [`IndexMapper::register_user`],
//!   the only mutation entry point

use crate::error::{RecError, Result};
use crate::types::{ItemId, UserId};
use std::collections::HashMap;
use std::hash::Hash;

/// Append-only bijection between ids and `0..len` indices.
///
/// Rust concept: one generic struct serves both sides. `Id: Copy + Eq + Hash`
/// is all the hash index needs, so users and items share the same code.
#[derive(Debug, Clone, Default)]
pub struct IdIndex<Id> {
    ids: Vec<Id>,
    positions: HashMap<Id, usize>,
}

impl<Id: Copy + Eq + Hash> IdIndex<Id> {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Build from ids that are already distinct, in index order
    fn from_distinct(ids: Vec<Id>) -> Self {
        let positions = ids.iter().enumerate().map(|(idx, &id)| (id, idx)).collect();
        Self { ids, positions }
    }

    /// Return the index of `id`, appending it at the end if unknown.
    fn get_or_insert(&mut self, id: Id) -> usize {
        if let Some(&idx) = self.positions.get(&id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id);
        self.positions.insert(id, idx);
        idx
    }

    pub fn position(&self, id: Id) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn id(&self, index: usize) -> Option<Id> {
        self.ids.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in index order
    pub fn ids(&self) -> &[Id] {
        &self.ids
    }
}

/// User and item index translation for one interaction matrix.
#[derive(Debug, Clone, Default)]
pub struct IndexMapper {
    users: IdIndex<UserId>,
    items: IdIndex<ItemId>,
}

impl IndexMapper {
    /// Build from the ids observed in the data.
    ///
    /// Ids are sorted and deduplicated so indices follow ascending id order.
    pub fn from_ids(
        user_ids: impl IntoIterator<Item = UserId>,
        item_ids: impl IntoIterator<Item = ItemId>,
    ) -> Self {
        Self {
            users: IdIndex::from_distinct(sorted_distinct(user_ids)),
            items: IdIndex::from_distinct(sorted_distinct(item_ids)),
        }
    }

    /// Register a user discovered at inference time.
    ///
    /// Unknown ids get the next sequential index; known ids keep theirs and
    /// nothing is mutated.
    pub fn register_user(&mut self, user_id: UserId) -> usize {
        let before = self.users.len();
        let idx = self.users.get_or_insert(user_id);
        if self.users.len() > before {
            tracing::debug!("Registered new user {} at index {}", user_id, idx);
        }
        idx
    }

    pub fn user_index(&self, user_id: UserId) -> Result<usize> {
        self.users
            .position(user_id)
            .ok_or(RecError::UnknownUser(user_id))
    }

    /// Items never auto-register, unseen ids are an error
    pub fn item_index(&self, item_id: ItemId) -> Result<usize> {
        self.items
            .position(item_id)
            .ok_or(RecError::UnknownItem(item_id))
    }

    pub fn user_id(&self, index: usize) -> Result<UserId> {
        self.users
            .id(index)
            .ok_or(RecError::IndexOutOfRange { kind: "user", index })
    }

    pub fn item_id(&self, index: usize) -> Result<ItemId> {
        self.items
            .id(index)
            .ok_or(RecError::IndexOutOfRange { kind: "item", index })
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.users.position(user_id).is_some()
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    pub fn user_ids(&self) -> &[UserId] {
        self.users.ids()
    }

    pub fn item_ids(&self) -> &[ItemId] {
        self.items.ids()
    }
}

fn sorted_distinct<Id: Ord>(ids: impl IntoIterator<Item = Id>) -> Vec<Id> {
    let mut ids: Vec<Id> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
