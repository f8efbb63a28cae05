//! In-memory item store
//!
//! A single mutex owns both the record table and the id allocator, so every
//! operation observes and leaves the store in a consistent state. The lock is
//! only ever held for a map lookup, insert or removal and never across an
//! `.await`.

mod item;

pub use item::{IdsExhausted, InvalidItemId, Item, ItemId};

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Records and the next id to hand out, always locked together
#[derive(Debug)]
struct Inventory {
    records: BTreeMap<ItemId, Item>,
    /// `None` once `ItemId::MAX` has been allocated
    next_id: Option<ItemId>,
}

/// Thread-safe id → item table
#[derive(Debug)]
pub struct ItemStore {
    inner: Mutex<Inventory>,
}

impl ItemStore {
    pub const fn new() -> Self {
        Self::starting_at(ItemId::FIRST)
    }

    pub(crate) const fn starting_at(first: ItemId) -> Self {
        Self {
            inner: Mutex::new(Inventory {
                records: BTreeMap::new(),
                next_id: Some(first),
            }),
        }
    }

    // A panic while holding the guard cannot leave the inventory half-written:
    // every mutation is a single map call.
    fn lock(&self) -> MutexGuard<'_, Inventory> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All items in ascending id order
    pub fn list(&self) -> Vec<Item> {
        self.lock().records.values().cloned().collect()
    }

    /// Insert an item under a freshly allocated id. Ids are never reused, so
    /// once `ItemId::MAX` is taken every further create fails.
    pub fn create(&self, item: Item) -> Result<ItemId, IdsExhausted> {
        let mut inventory = self.lock();
        let id = inventory.next_id.ok_or(IdsExhausted)?;
        inventory.next_id = id.checked_next();
        inventory.records.insert(id, item);
        Ok(id)
    }

    pub fn get(&self, id: ItemId) -> Option<Item> {
        self.lock().records.get(&id).cloned()
    }

    /// Replace the price of an existing item.
    ///
    /// The stored name always wins over `fields.name`: items cannot be renamed
    /// through an update. Returns the merged record, or `None` when `id` is
    /// absent.
    pub fn update(&self, id: ItemId, fields: Item) -> Option<Item> {
        let mut inventory = self.lock();
        let stored = inventory.records.get_mut(&id)?;
        *stored = Item {
            name: std::mem::take(&mut stored.name),
            price: fields.price,
        };
        Some(stored.clone())
    }

    /// Remove an item, returning it if it was present
    pub fn delete(&self, id: ItemId) -> Option<Item> {
        self.lock().records.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}
