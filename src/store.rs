//! Ordered, id-indexed item storage.
//!
//! Items live in a single arena (`Vec<Item>`) in insertion order, with an
//! id → slot index on the side. Every phase works on the arena directly,
//! so a mutation made in one phase is seen by all later ones.
//!
//! # Ordering
//!
//! Enumeration always follows insertion order, except that sorting a
//! collection permutes that collection's items among the slots they
//! already occupy. Items of other collections never move.

use crate::item::Item;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// Returned by [`ItemStore::try_insert`] when the id is taken.
#[derive(Debug)]
pub struct DuplicateId(pub Item);

/// Arena of items indexed by id.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: Vec<Item>,
    index: FxHashMap<String, usize>,
}

impl ItemStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored items.
    ///
    /// Call this at the start of each build to ensure fresh data.
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Insert an item, replacing in place any item with the same id.
    ///
    /// Only the initial load pass may overwrite; everything else goes
    /// through [`try_insert`](Self::try_insert).
    pub fn upsert(&mut self, item: Item) {
        match self.index.get(item.id()) {
            Some(&slot) => self.items[slot] = item,
            None => self.push(item),
        }
    }

    /// Insert an item whose id must not be present yet.
    pub fn try_insert(&mut self, item: Item) -> Result<(), DuplicateId> {
        if self.contains(item.id()) {
            return Err(DuplicateId(item));
        }
        self.push(item);
        Ok(())
    }

    fn push(&mut self, item: Item) {
        self.index.insert(item.id().to_owned(), self.items.len());
        self.items.push(item);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index.get(id).map(|&slot| &self.items[slot])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.index.get(id).map(|&slot| &mut self.items[slot])
    }

    /// All items, in store order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items.iter_mut()
    }

    /// Items belonging to `collection`, in store order.
    pub fn in_collection<'a>(&'a self, collection: &'a str) -> impl Iterator<Item = &'a Item> {
        self.items
            .iter()
            .filter(move |item| item.collection() == Some(collection))
    }

    /// Ids of the items in `collection`, in store order.
    pub fn ids_in_collection(&self, collection: &str) -> Vec<String> {
        self.in_collection(collection)
            .map(|item| item.id().to_owned())
            .collect()
    }

    /// Stable-sort the items of `collection` within their current slots.
    ///
    /// Equal items keep their relative order.
    pub fn sort_collection<F>(&mut self, collection: &str, mut compare: F)
    where
        F: FnMut(&Item, &Item) -> Ordering,
    {
        let slots: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.collection() == Some(collection))
            .map(|(slot, _)| slot)
            .collect();

        let mut order = slots.clone();
        order.sort_by(|&a, &b| compare(&self.items[a], &self.items[b]));

        let mut taken: Vec<Option<Item>> = std::mem::take(&mut self.items)
            .into_iter()
            .map(Some)
            .collect();
        let mut sorted: Vec<Item> = order
            .iter()
            .filter_map(|&slot| taken[slot].take())
            .collect::<Vec<_>>();
        sorted.reverse();

        for &slot in &slots {
            taken[slot] = sorted.pop();
        }
        self.items = taken.into_iter().flatten().collect();
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (slot, item) in self.items.iter().enumerate() {
            self.index.insert(item.id().to_owned(), slot);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the store, yielding items in store order.
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}
