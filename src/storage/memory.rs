use super::types::{DataItem, Key, LockToken};
use crate::error::StoreError;

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct Slot {
    item: DataItem,
    lock: Option<LockToken>,
}

impl Slot {
    fn unlocked(item: DataItem) -> Self {
        Self { item, lock: None }
    }
}

/// Versioned key-value storage owned by exactly one node.
///
/// Only the owning node's task touches it, so there is no interior locking; the
/// per-key lock flag is a protocol-level marker for in-flight updates.
#[derive(Debug, Default)]
pub struct LocalStore {
    slots: BTreeMap<Key, Slot>,
    next_token: LockToken,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the item at version 1, or bumps the version and replaces the value.
    /// Clears the lock either way.
    pub fn put(&mut self, key: Key, value: String) -> &DataItem {
        let slot = self
            .slots
            .entry(key)
            .and_modify(|slot| {
                slot.item.version += 1;
                slot.lock = None;
            })
            .or_insert_with(|| Slot::unlocked(DataItem::new(String::new())));
        slot.item.value = value;
        &slot.item
    }

    /// Create-only variant of [`put`](Self::put) used by plain writes.
    pub fn insert_new(&mut self, key: Key, value: String) -> Result<&DataItem, StoreError> {
        if self.slots.contains_key(&key) {
            return Err(StoreError::ExistingKey(key));
        }
        Ok(self.put(key, value))
    }

    /// Unconditional set; clears the lock.
    pub fn put_exact(&mut self, key: Key, item: DataItem) {
        self.slots.insert(key, Slot::unlocked(item));
    }

    /// Sets the item only when the key is missing. Returns whether it was stored.
    pub fn put_if_absent(&mut self, key: Key, item: DataItem) -> bool {
        if self.slots.contains_key(&key) {
            return false;
        }
        self.slots.insert(key, Slot::unlocked(item));
        true
    }

    /// Keeps, per key, whichever of the local and incoming items has the higher
    /// version. Returns how many keys were written.
    pub fn merge_newer<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = (Key, DataItem)>,
    {
        let mut written = 0;
        for (key, incoming) in items {
            match self.slots.get_mut(&key) {
                Some(slot) => {
                    if incoming.is_newer_than(&slot.item) {
                        slot.item = incoming;
                        written += 1;
                    }
                }
                None => {
                    self.slots.insert(key, Slot::unlocked(incoming));
                    written += 1;
                }
            }
        }
        written
    }

    pub fn get(&self, key: Key) -> Option<&DataItem> {
        self.slots.get(&key).map(|slot| &slot.item)
    }

    /// The item, if it exists and is not locked.
    pub fn readable(&self, key: Key) -> Result<&DataItem, StoreError> {
        match self.slots.get(&key) {
            None => Err(StoreError::UnknownKey(key)),
            Some(slot) if slot.lock.is_some() => Err(StoreError::LockedKey(key)),
            Some(slot) => Ok(&slot.item),
        }
    }

    /// Locks the key and returns its current item plus the token of this lock.
    pub fn lock_and_get(&mut self, key: Key) -> Result<(DataItem, LockToken), StoreError> {
        let token = self.next_token;
        let slot = self.slots.get_mut(&key).ok_or(StoreError::UnknownKey(key))?;
        if slot.lock.is_some() {
            return Err(StoreError::LockedKey(key));
        }
        slot.lock = Some(token);
        self.next_token += 1;
        Ok((slot.item.clone(), token))
    }

    pub fn unlock(&mut self, key: Key) {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.lock = None;
        }
    }

    /// Releases the lock only if it is still the one identified by `token`.
    pub fn release(&mut self, key: Key, token: LockToken) -> bool {
        match self.slots.get_mut(&key) {
            Some(slot) if slot.lock == Some(token) => {
                slot.lock = None;
                true
            }
            _ => false,
        }
    }

    pub fn unlock_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.lock = None;
        }
    }

    pub fn has(&self, key: Key) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn is_locked(&self, key: Key) -> bool {
        self.slots
            .get(&key)
            .map(|slot| slot.lock.is_some())
            .unwrap_or(false)
    }

    pub fn keys(&self) -> BTreeSet<Key> {
        self.slots.keys().copied().collect()
    }

    pub fn locked_keys(&self) -> BTreeSet<Key> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.lock.is_some())
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn all_items(&self) -> BTreeMap<Key, DataItem> {
        self.slots
            .iter()
            .map(|(key, slot)| (*key, slot.item.clone()))
            .collect()
    }

    /// Keeps only keys for which `keep` holds and returns the dropped ones.
    pub fn retain_keys<F>(&mut self, mut keep: F) -> Vec<Key>
    where
        F: FnMut(Key) -> bool,
    {
        let dropped: Vec<Key> = self.slots.keys().copied().filter(|key| !keep(*key)).collect();
        for key in &dropped {
            self.slots.remove(key);
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
