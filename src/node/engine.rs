//! Data Node Actor
//!
//! Owns one local store, one ring view, one quorum tracker and (while joining) one
//! hand-off tracker. Messages are processed one at a time to completion, so none of
//! that state needs locking.

use super::protocol::{Envelope, Message, Origin};
use super::types::{NodeSnapshot, NodeState};
use crate::config::ClusterConfig;
use crate::handoff::tracker::HandoffTracker;
use crate::membership::ring::Ring;
use crate::membership::types::{NodeHandle, Position};
use crate::quorum::tracker::QuorumTracker;
use crate::storage::memory::LocalStore;
use crate::storage::types::Key;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct DataNode {
    pub(super) position: Position,
    /// Handle to this node's own mailbox; used as reply address and for timers.
    pub(super) me: NodeHandle,
    pub(super) config: ClusterConfig,
    pub(super) state: NodeState,
    pub(super) ring: Ring,
    pub(super) store: LocalStore,
    pub(super) requests: QuorumTracker,
    pub(super) join: Option<HandoffTracker>,
    pub(super) recovering: bool,
}

impl DataNode {
    pub fn new(position: Position, me: NodeHandle, config: ClusterConfig) -> Self {
        Self {
            position,
            me,
            ring: Ring::new(config.replicas),
            config,
            state: NodeState::Active,
            store: LocalStore::new(),
            requests: QuorumTracker::new(),
            join: None,
            recovering: false,
        }
    }

    /// Starts a node task at `position` and returns its handle.
    pub fn spawn(position: Position, config: ClusterConfig) -> (NodeHandle, JoinHandle<()>) {
        let (handle, mailbox) = NodeHandle::channel();
        let node = DataNode::new(position, handle.clone(), config);
        let task = tokio::spawn(node.run(mailbox));
        (handle, task)
    }

    pub async fn run(mut self, mut mailbox: mpsc::UnboundedReceiver<Envelope>) {
        tracing::info!("Node {} started ({})", self.position, self.me.id());

        while let Some(envelope) = mailbox.recv().await {
            self.handle(envelope);
        }

        tracing::info!("Node {} stopped", self.position);
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn handle(&mut self, envelope: Envelope) {
        tracing::trace!(
            "Node {} [{:?}] <- {}",
            self.position,
            self.state,
            envelope.message.kind()
        );
        match self.state {
            NodeState::Active => self.on_active(envelope),
            NodeState::Crashed => self.on_crashed(envelope),
        }
    }

    fn on_active(&mut self, Envelope { origin, message }: Envelope) {
        match message {
            Message::InitializeGroup { entries } => self.on_initialize_group(entries),
            Message::AskWrite { key, value } => self.on_ask_write(key, value),
            Message::Write { key, value } => self.on_write(key, value),

            Message::AskRead { key, request_id } => self.on_ask_read(origin, key, request_id),
            Message::ReadProbe { key, request_id } => self.on_read_probe(origin, key, request_id),
            Message::ReadReply { item, request_id, .. } => self.on_read_reply(item, request_id),
            Message::ReadExpired { request_id } => self.on_read_expired(request_id),

            Message::AskUpdate {
                key,
                value,
                request_id,
            } => self.on_ask_update(origin, key, value, request_id),
            Message::VersionProbe { key, request_id } => {
                self.on_version_probe(origin, key, request_id)
            }
            Message::VersionReply {
                version,
                request_id,
                ..
            } => self.on_version_reply(version, request_id),
            Message::UpdateCommit {
                key,
                value,
                version,
            } => self.on_update_commit(key, value, version),
            Message::UpdateExpired { request_id } => self.on_update_expired(request_id),
            Message::LockExpired { key, token } => self.on_lock_expired(key, token),

            Message::AskToJoin { bootstrap } => self.on_ask_to_join(bootstrap),
            Message::AskGroup => self.on_ask_group(origin),
            Message::GroupReply { entries } => self.on_group_reply(entries),
            Message::AskKeys => self.on_ask_keys(origin),
            Message::KeysReply { keys } => self.on_keys_reply(keys),
            Message::AskItemData { key } => self.on_ask_item_data(origin, key),
            Message::ItemDataReply { key, item } => self.on_item_data_reply(key, item),
            Message::AnnounceJoin { position } => self.on_announce_join(origin, position),

            Message::AskToLeave => self.on_ask_to_leave(),
            Message::AnnounceLeave => self.on_announce_leave(origin),
            Message::NewData { key, item } => self.on_new_data(key, item),

            Message::AskCrash => self.on_crash(),
            Message::AskGroupToRecover => self.on_ask_group_to_recover(origin),
            Message::AskDataToRecover { position } => {
                self.on_ask_data_to_recover(origin, position)
            }

            Message::AskStatus => self.on_ask_status(),
            Message::PrintStatus => self.print_status(),
            Message::Inspect { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }

            other @ (Message::AskRecover { .. }
            | Message::GroupToRecoverReply { .. }
            | Message::DataToRecoverReply { .. }
            | Message::RecoveryTimeout) => {
                tracing::warn!(
                    "Node {} is active, ignoring {}",
                    self.position,
                    other.kind()
                );
            }
        }
    }

    fn on_crashed(&mut self, Envelope { origin, message }: Envelope) {
        match message {
            Message::AskRecover { helper } => self.on_ask_recover(helper),
            Message::GroupToRecoverReply { entries } => self.on_group_to_recover(entries),
            Message::DataToRecoverReply { items } => self.on_data_to_recover(items),
            Message::RecoveryTimeout => self.on_recovery_timeout(),
            Message::Inspect { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
            other => {
                tracing::debug!(
                    "Node {} is crashed, discarding {} from {:?}",
                    self.position,
                    other.kind(),
                    origin
                );
            }
        }
    }

    /// Node handle a reply has to go to, if the message came from a peer.
    pub(super) fn reply_to<'a>(&self, origin: &'a Origin, kind: &str) -> Option<&'a NodeHandle> {
        match origin {
            Origin::Node(handle) => Some(handle),
            other => {
                tracing::warn!(
                    "Node {}: {} from {:?} has no peer to answer",
                    self.position,
                    kind,
                    other
                );
                None
            }
        }
    }

    pub(super) fn send(&self, target: &NodeHandle, message: Message) {
        target.send(Origin::Node(self.me.clone()), message);
    }

    /// Drops every local key this node no longer replicates. No-op while the
    /// node is not part of its own ring view.
    pub(super) fn drop_foreign_keys(&mut self) -> Vec<Key> {
        if !self.ring.contains(self.me.id()) {
            return Vec::new();
        }
        let ring = &self.ring;
        let me = self.me.id();
        let dropped = self.store.retain_keys(|key| ring.is_replica(key, me));
        if !dropped.is_empty() {
            tracing::debug!(
                "Node {} dropped {} keys it no longer owns: {:?}",
                self.position,
                dropped.len(),
                dropped
            );
        }
        dropped
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            position: self.position,
            state: self.state,
            ring: self.ring.positions(),
            items: self.store.all_items(),
            locked_keys: self.store.locked_keys(),
            pending_requests: self.requests.len(),
            joining: self.join.is_some(),
        }
    }

    fn on_ask_status(&self) {
        for handle in self.ring.handles() {
            self.send(&handle, Message::PrintStatus);
        }
    }

    fn print_status(&self) {
        let items = self.store.all_items();
        tracing::info!(
            "Node {} [{:?}] holds {} items",
            self.position,
            self.state,
            items.len()
        );
        for (key, item) in items {
            tracing::info!(
                "  key {} -> \"{}\" (v{}){}",
                key,
                item.value,
                item.version,
                if self.store.is_locked(key) { " [locked]" } else { "" }
            );
        }
    }
}
