use super::types::{NodeHandle, NodeId, Position, RingEntry};
use crate::error::RingError;
use crate::storage::types::Key;

/// One node's view of the ring: entries sorted by position, no duplicate positions.
///
/// Every node keeps its own copy. Copies converge only through group, join,
/// leave and recovery messages.
#[derive(Debug, Clone)]
pub struct Ring {
    entries: Vec<RingEntry>,
    replicas: usize,
}

impl Ring {
    pub fn new(replicas: usize) -> Self {
        Self {
            entries: Vec::new(),
            replicas,
        }
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RingEntry] {
        &self.entries
    }

    pub fn positions(&self) -> Vec<Position> {
        self.entries.iter().map(|entry| entry.position).collect()
    }

    pub fn handles(&self) -> Vec<NodeHandle> {
        self.entries.iter().map(|entry| entry.handle.clone()).collect()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.entries.iter().any(|entry| entry.handle.id() == id)
    }

    /// Merges entries into the ring.
    ///
    /// An entry already present with the same position and node is skipped, so
    /// re-applying a snapshot is harmless. A position claimed by a different node
    /// is a configuration error and leaves the ring untouched.
    pub fn add_nodes(&mut self, nodes: Vec<RingEntry>) -> Result<(), RingError> {
        let mut merged = self.entries.clone();
        for node in nodes {
            match merged.iter().find(|entry| entry.position == node.position) {
                Some(existing) if existing.handle == node.handle => continue,
                Some(_) => return Err(RingError::DuplicatePosition(node.position)),
                None => merged.push(node),
            }
        }
        merged.sort_by_key(|entry| entry.position);
        self.entries = merged;
        Ok(())
    }

    pub fn add_node(&mut self, node: RingEntry) -> Result<(), RingError> {
        self.add_nodes(vec![node])
    }

    /// Drops every entry belonging to `id`.
    pub fn remove_node(&mut self, id: &NodeId) {
        self.entries.retain(|entry| entry.handle.id() != id);
    }

    /// Discards the current view and installs `nodes` instead.
    pub fn replace(&mut self, nodes: Vec<RingEntry>) -> Result<(), RingError> {
        let mut fresh = Ring::new(self.replicas);
        fresh.add_nodes(nodes)?;
        self.entries = fresh.entries;
        Ok(())
    }

    /// Index of the first entry whose position is `>= key`, wrapping to 0.
    fn anchor(&self, key: Key) -> usize {
        let idx = self.entries.partition_point(|entry| entry.position < key);
        if idx == self.entries.len() { 0 } else { idx }
    }

    /// The nodes responsible for `key`: its anchor entry and the following
    /// `replicas - 1` entries, wrapping around. Never yields a node twice, so a
    /// ring smaller than the replica count returns every member once.
    pub fn find_replicas(&self, key: Key) -> Vec<NodeHandle> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let count = self.replicas.min(self.entries.len());
        let start = self.anchor(key);

        (0..count)
            .map(|offset| self.entries[(start + offset) % self.entries.len()].handle.clone())
            .collect()
    }

    pub fn is_replica(&self, key: Key, id: &NodeId) -> bool {
        self.find_replicas(key).iter().any(|handle| handle.id() == id)
    }

    /// The `replicas` successors starting at the anchor of `key`, followed by
    /// the `replicas` predecessors before it. Duplicates are removed while
    /// keeping the first occurrence.
    pub fn find_neighbors(&self, key: Key) -> Vec<NodeHandle> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let len = self.entries.len();
        let start = self.anchor(key);
        let mut neighbors: Vec<NodeHandle> = Vec::with_capacity(2 * self.replicas);

        let successors = (0..self.replicas).map(|offset| (start + offset) % len);
        let predecessors = (1..=self.replicas).map(|offset| (start + len * self.replicas - offset) % len);

        for idx in successors.chain(predecessors) {
            let handle = &self.entries[idx].handle;
            if !neighbors.contains(handle) {
                neighbors.push(handle.clone());
            }
        }
        neighbors
    }

    /// The entry immediately after `position` on the ring.
    pub fn clockwise_neighbor(&self, position: Position) -> Option<NodeHandle> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = self.anchor(position.wrapping_add(1));
        Some(self.entries[idx].handle.clone())
    }
}
