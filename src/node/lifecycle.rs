//! Membership lifecycle: join, leave, crash and recovery.

use super::engine::DataNode;
use super::protocol::{Message, Origin};
use super::timer;
use super::types::NodeState;
use crate::handoff::tracker::HandoffTracker;
use crate::membership::types::{NodeHandle, Position, RingEntry};
use crate::storage::types::{DataItem, Key};

use std::collections::{BTreeMap, BTreeSet};

impl DataNode {
    // ------------------------------------------------------------------
    // Join (joining node)
    // ------------------------------------------------------------------

    pub(super) fn on_ask_to_join(&mut self, bootstrap: NodeHandle) {
        tracing::info!(
            "Node {} joining through {}",
            self.position,
            bootstrap.id()
        );
        self.send(&bootstrap, Message::AskGroup);
    }

    pub(super) fn on_group_reply(&mut self, entries: Vec<RingEntry>) {
        if let Err(e) = self.ring.add_nodes(entries) {
            tracing::error!("Node {} cannot join: {}", self.position, e);
            return;
        }
        match self.ring.clockwise_neighbor(self.position) {
            Some(neighbor) => self.send(&neighbor, Message::AskKeys),
            None => tracing::error!("Node {} received an empty ring, join aborted", self.position),
        }
    }

    pub(super) fn on_keys_reply(&mut self, keys: BTreeSet<Key>) {
        if keys.is_empty() {
            self.finish_join(BTreeMap::new());
            return;
        }

        let expected = self.ring.replicas().min(self.ring.len());
        tracing::debug!(
            "Node {} pulling {} keys from {} replicas each",
            self.position,
            keys.len(),
            expected
        );
        for &key in &keys {
            for replica in self.ring.find_replicas(key) {
                self.send(&replica, Message::AskItemData { key });
            }
        }
        self.join = Some(HandoffTracker::new(keys, expected));
    }

    pub(super) fn on_item_data_reply(&mut self, key: Key, item: Option<DataItem>) {
        let Some(tracker) = self.join.as_mut() else {
            tracing::debug!("Node {}: hand-off reply for key {} outside a join", self.position, key);
            return;
        };
        if tracker.record_item(key, item)
            && let Some(tracker) = self.join.take()
        {
            self.finish_join(tracker.into_items());
        }
    }

    fn finish_join(&mut self, items: BTreeMap<Key, DataItem>) {
        self.join = None;
        for (key, item) in items {
            self.store.put_exact(key, item);
        }

        for peer in self.ring.handles() {
            self.send(
                &peer,
                Message::AnnounceJoin {
                    position: self.position,
                },
            );
        }
        if let Err(e) = self
            .ring
            .add_node(RingEntry::new(self.position, self.me.clone()))
        {
            tracing::error!("Node {} cannot take its position: {}", self.position, e);
            return;
        }
        self.drop_foreign_keys();

        tracing::info!(
            "Node {} joined, holding {} keys, ring {:?}",
            self.position,
            self.store.len(),
            self.ring.positions()
        );
    }

    // ------------------------------------------------------------------
    // Join (peer side)
    // ------------------------------------------------------------------

    pub(super) fn on_ask_group(&mut self, origin: Origin) {
        if let Some(peer) = self.reply_to(&origin, "AskGroup") {
            self.send(
                peer,
                Message::GroupReply {
                    entries: self.ring.entries().to_vec(),
                },
            );
        }
    }

    pub(super) fn on_ask_keys(&mut self, origin: Origin) {
        if let Some(peer) = self.reply_to(&origin, "AskKeys") {
            self.send(
                peer,
                Message::KeysReply {
                    keys: self.store.keys(),
                },
            );
        }
    }

    pub(super) fn on_ask_item_data(&mut self, origin: Origin, key: Key) {
        if let Some(peer) = self.reply_to(&origin, "AskItemData") {
            self.send(
                peer,
                Message::ItemDataReply {
                    key,
                    item: self.store.get(key).cloned(),
                },
            );
        }
    }

    pub(super) fn on_announce_join(&mut self, origin: Origin, position: Position) {
        let Some(peer) = self.reply_to(&origin, "AnnounceJoin") else {
            return;
        };
        if let Err(e) = self.ring.add_node(RingEntry::new(position, peer.clone())) {
            tracing::error!("Node {} rejected joiner: {}", self.position, e);
            return;
        }
        self.drop_foreign_keys();
        tracing::info!("Node {} saw node {} join", self.position, position);
    }

    // ------------------------------------------------------------------
    // Leave
    // ------------------------------------------------------------------

    pub(super) fn on_ask_to_leave(&mut self) {
        for peer in self.ring.handles() {
            if peer != self.me {
                self.send(&peer, Message::AnnounceLeave);
            }
        }
        self.ring.remove_node(self.me.id());

        let items = self.store.all_items();
        for (key, item) in &items {
            for replica in self.ring.find_replicas(*key) {
                self.send(
                    &replica,
                    Message::NewData {
                        key: *key,
                        item: item.clone(),
                    },
                );
            }
        }
        self.store.clear();

        tracing::info!(
            "Node {} left the ring, handed off {} keys",
            self.position,
            items.len()
        );
    }

    pub(super) fn on_announce_leave(&mut self, origin: Origin) {
        if let Some(peer) = self.reply_to(&origin, "AnnounceLeave") {
            self.ring.remove_node(peer.id());
            tracing::info!(
                "Node {} removed {} from its ring",
                self.position,
                peer.id()
            );
        }
    }

    pub(super) fn on_new_data(&mut self, key: Key, item: DataItem) {
        if !self.store.put_if_absent(key, item) {
            tracing::debug!(
                "Node {} kept its own copy of key {} during hand-off",
                self.position,
                key
            );
        }
    }

    // ------------------------------------------------------------------
    // Crash and recovery
    // ------------------------------------------------------------------

    pub(super) fn on_crash(&mut self) {
        self.state = NodeState::Crashed;
        self.recovering = false;
        self.requests.clear();
        self.join = None;
        self.store.unlock_all();
        tracing::info!("Node {} crashed", self.position);
    }

    pub(super) fn on_ask_recover(&mut self, helper: NodeHandle) {
        tracing::info!(
            "Node {} recovering through {}",
            self.position,
            helper.id()
        );
        self.send(&helper, Message::AskGroupToRecover);
    }

    pub(super) fn on_ask_group_to_recover(&mut self, origin: Origin) {
        if let Some(peer) = self.reply_to(&origin, "AskGroupToRecover") {
            self.send(
                peer,
                Message::GroupToRecoverReply {
                    entries: self.ring.entries().to_vec(),
                },
            );
        }
    }

    pub(super) fn on_group_to_recover(&mut self, entries: Vec<RingEntry>) {
        if let Err(e) = self.ring.replace(entries) {
            tracing::error!("Node {} cannot recover: {}", self.position, e);
            return;
        }
        self.drop_foreign_keys();

        let mut asked = 0;
        for neighbor in self.ring.find_neighbors(self.position) {
            if neighbor == self.me {
                continue;
            }
            self.send(
                &neighbor,
                Message::AskDataToRecover {
                    position: self.position,
                },
            );
            asked += 1;
        }
        tracing::debug!(
            "Node {} asked {} neighbors for recovery data",
            self.position,
            asked
        );

        self.recovering = true;
        timer::schedule(&self.me, self.config.timeout, Message::RecoveryTimeout);
    }

    pub(super) fn on_ask_data_to_recover(&mut self, origin: Origin, position: Position) {
        let Some(peer) = self.reply_to(&origin, "AskDataToRecover") else {
            return;
        };
        let items: BTreeMap<Key, DataItem> = self
            .store
            .all_items()
            .into_iter()
            .filter(|(key, _)| self.ring.is_replica(*key, peer.id()))
            .collect();
        tracing::debug!(
            "Node {} sending {} items to recovering node {}",
            self.position,
            items.len(),
            position
        );
        self.send(peer, Message::DataToRecoverReply { items });
    }

    pub(super) fn on_data_to_recover(&mut self, items: BTreeMap<Key, DataItem>) {
        let written = self.store.merge_newer(items);
        tracing::debug!(
            "Node {} merged {} recovered items",
            self.position,
            written
        );
    }

    pub(super) fn on_recovery_timeout(&mut self) {
        if !self.recovering {
            tracing::debug!("Node {}: stale recovery timer ignored", self.position);
            return;
        }
        self.recovering = false;
        self.state = NodeState::Active;
        tracing::info!(
            "Node {} recovered, holding {} keys",
            self.position,
            self.store.len()
        );
    }
}
