use crate::storage::types::{DataItem, Key};

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Collects the data a joining node pulls from the current replicas of every
/// key its clockwise neighbor reported.
///
/// A key leaves the pending set once `replicas_expected` replies for it have
/// arrived. Replies for keys outside the pending set are ignored.
#[derive(Debug, Clone)]
pub struct HandoffTracker {
    pending_keys: BTreeSet<Key>,
    best_known: BTreeMap<Key, DataItem>,
    acks: HashMap<Key, usize>,
    replicas_expected: usize,
}

impl HandoffTracker {
    pub fn new(keys: BTreeSet<Key>, replicas_expected: usize) -> Self {
        Self {
            pending_keys: keys,
            best_known: BTreeMap::new(),
            acks: HashMap::new(),
            replicas_expected: replicas_expected.max(1),
        }
    }

    /// Records one replica's answer for `key`. A replica without the key answers
    /// with `None`, which still counts as an acknowledgment.
    ///
    /// Returns `true` exactly when this reply empties the pending set.
    pub fn record_item(&mut self, key: Key, item: Option<DataItem>) -> bool {
        if !self.pending_keys.contains(&key) {
            tracing::debug!("Hand-off reply for key {} outside the pending set ignored", key);
            return false;
        }

        if let Some(item) = item
            && self
                .best_known
                .get(&key)
                .is_none_or(|known| item.is_newer_than(known))
        {
            self.best_known.insert(key, item);
        }

        let acks = self.acks.entry(key).or_insert(0);
        *acks += 1;
        if *acks >= self.replicas_expected {
            self.pending_keys.remove(&key);
            return self.pending_keys.is_empty();
        }
        false
    }

    /// Best-known item per key, ready to be installed into the local store.
    pub fn collected_items(&self) -> &BTreeMap<Key, DataItem> {
        &self.best_known
    }

    pub fn into_items(self) -> BTreeMap<Key, DataItem> {
        self.best_known
    }

    pub fn pending_keys(&self) -> &BTreeSet<Key> {
        &self.pending_keys
    }

    pub fn is_complete(&self) -> bool {
        self.pending_keys.is_empty()
    }

    pub fn replicas_expected(&self) -> usize {
        self.replicas_expected
    }
}
