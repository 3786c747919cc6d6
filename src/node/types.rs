use crate::membership::types::Position;
use crate::storage::types::{DataItem, Key, Version};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    Active,
    /// Simulated outage: only the recovery sub-protocol is served.
    Crashed,
}

/// Point-in-time view of a node, returned by `Message::Inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub position: Position,
    pub state: NodeState,
    pub ring: Vec<Position>,
    pub items: BTreeMap<Key, DataItem>,
    pub locked_keys: BTreeSet<Key>,
    pub pending_requests: usize,
    pub joining: bool,
}

impl NodeSnapshot {
    pub fn version_of(&self, key: Key) -> Option<Version> {
        self.items.get(&key).map(|item| item.version)
    }

    pub fn value_of(&self, key: Key) -> Option<&str> {
        self.items.get(&key).map(|item| item.value.as_str())
    }
}
