//! Client-facing paths: plain write, quorum read and two-phase update.
//!
//! The node receiving the client request coordinates it; every replica answers
//! the coordinator directly. Rejected probes are logged and left unanswered.

use super::engine::DataNode;
use super::protocol::{Message, Origin};
use super::timer;
use crate::client::types::{ClientHandle, ClientReply};
use crate::membership::types::RingEntry;
use crate::quorum::types::{RequestId, Resolution, VoteOutcome};
use crate::storage::types::{DataItem, Key, LockToken, Version};

impl DataNode {
    pub(super) fn on_initialize_group(&mut self, entries: Vec<RingEntry>) {
        match self.ring.add_nodes(entries) {
            Ok(()) => tracing::debug!(
                "Node {} initialized ring {:?}",
                self.position,
                self.ring.positions()
            ),
            Err(e) => tracing::error!("Node {} rejected ring: {}", self.position, e),
        }
    }

    // ------------------------------------------------------------------
    // Plain write
    // ------------------------------------------------------------------

    pub(super) fn on_ask_write(&mut self, key: Key, value: String) {
        let replicas = self.ring.find_replicas(key);
        tracing::debug!(
            "Node {} forwarding write of key {} to {} replicas",
            self.position,
            key,
            replicas.len()
        );
        for replica in &replicas {
            self.send(
                replica,
                Message::Write {
                    key,
                    value: value.clone(),
                },
            );
        }
    }

    pub(super) fn on_write(&mut self, key: Key, value: String) {
        match self.store.insert_new(key, value) {
            Ok(item) => tracing::debug!(
                "Node {} stored key {} = \"{}\" (v{})",
                self.position,
                key,
                item.value,
                item.version
            ),
            Err(e) => tracing::error!("Node {}: write rejected: {}", self.position, e),
        }
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub(super) fn on_ask_read(&mut self, origin: Origin, key: Key, request_id: RequestId) {
        let Some(client) = client_of(origin, "AskRead") else {
            return;
        };
        if !self
            .requests
            .new_read(request_id.clone(), client, self.config.read_quorum)
        {
            return;
        }

        for replica in self.ring.find_replicas(key) {
            self.send(
                &replica,
                Message::ReadProbe {
                    key,
                    request_id: request_id.clone(),
                },
            );
        }
        timer::schedule(
            &self.me,
            self.config.timeout,
            Message::ReadExpired { request_id },
        );
    }

    pub(super) fn on_read_probe(&mut self, origin: Origin, key: Key, request_id: RequestId) {
        let Some(coordinator) = self.reply_to(&origin, "ReadProbe") else {
            return;
        };
        match self.store.readable(key) {
            Ok(item) => {
                let item = item.clone();
                self.send(
                    coordinator,
                    Message::ReadReply {
                        key,
                        item,
                        request_id,
                    },
                );
            }
            Err(e) => tracing::error!(
                "Node {}: read {} not answered: {}",
                self.position,
                request_id,
                e
            ),
        }
    }

    pub(super) fn on_read_reply(&mut self, item: DataItem, request_id: RequestId) {
        if self
            .requests
            .record_read_vote(&request_id, item.version, item.value)
            != VoteOutcome::Quorum
        {
            return;
        }
        if let Some(Resolution::Read {
            request_id,
            client,
            value,
        }) = self.requests.resolve_and_remove(&request_id)
        {
            tracing::debug!("Node {}: read {} reached quorum", self.position, request_id);
            client.deliver(ClientReply::ReadResult { request_id, value });
        }
    }

    pub(super) fn on_read_expired(&mut self, request_id: RequestId) {
        if !self.requests.still_pending(&request_id) {
            return;
        }
        if let Some(pending) = self.requests.discard(&request_id) {
            tracing::warn!("Node {}: read {} timed out", self.position, request_id);
            pending.client.deliver(ClientReply::ReadTimeout { request_id });
        }
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    pub(super) fn on_ask_update(
        &mut self,
        origin: Origin,
        key: Key,
        value: String,
        request_id: RequestId,
    ) {
        let Some(client) = client_of(origin, "AskUpdate") else {
            return;
        };
        if !self.requests.new_write(
            request_id.clone(),
            client,
            self.config.write_quorum,
            key,
            value,
        ) {
            return;
        }

        for replica in self.ring.find_replicas(key) {
            self.send(
                &replica,
                Message::VersionProbe {
                    key,
                    request_id: request_id.clone(),
                },
            );
        }
        timer::schedule(
            &self.me,
            self.config.timeout,
            Message::UpdateExpired { request_id },
        );
    }

    pub(super) fn on_version_probe(&mut self, origin: Origin, key: Key, request_id: RequestId) {
        let Some(coordinator) = self.reply_to(&origin, "VersionProbe") else {
            return;
        };
        match self.store.lock_and_get(key) {
            Ok((item, token)) => {
                self.send(
                    coordinator,
                    Message::VersionReply {
                        key,
                        version: item.version,
                        request_id,
                    },
                );
                timer::schedule(
                    &self.me,
                    self.config.timeout,
                    Message::LockExpired { key, token },
                );
            }
            Err(e) => tracing::error!(
                "Node {}: update {} not answered: {}",
                self.position,
                request_id,
                e
            ),
        }
    }

    pub(super) fn on_version_reply(&mut self, version: Version, request_id: RequestId) {
        if self.requests.record_write_vote(&request_id, version) != VoteOutcome::Quorum {
            return;
        }
        let Some(Resolution::Update {
            request_id,
            client,
            key,
            value,
            version,
        }) = self.requests.resolve_and_remove(&request_id)
        else {
            return;
        };

        tracing::debug!(
            "Node {}: update {} agreed on version {} for key {}",
            self.position,
            request_id,
            version,
            key
        );
        client.deliver(ClientReply::UpdateResult {
            request_id,
            version,
        });
        for replica in self.ring.find_replicas(key) {
            self.send(
                &replica,
                Message::UpdateCommit {
                    key,
                    value: value.clone(),
                    version,
                },
            );
        }
    }

    pub(super) fn on_update_commit(&mut self, key: Key, value: String, version: Version) {
        self.store.put_exact(key, DataItem::with_version(value, version));
        tracing::debug!(
            "Node {} installed key {} at version {}",
            self.position,
            key,
            version
        );
    }

    pub(super) fn on_update_expired(&mut self, request_id: RequestId) {
        if !self.requests.still_pending(&request_id) {
            return;
        }
        if let Some(pending) = self.requests.discard(&request_id) {
            tracing::warn!("Node {}: update {} timed out", self.position, request_id);
            pending
                .client
                .deliver(ClientReply::UpdateTimeout { request_id });
        }
    }

    pub(super) fn on_lock_expired(&mut self, key: Key, token: LockToken) {
        if self.store.release(key, token) {
            tracing::warn!(
                "Node {}: lock on key {} released by safety timer",
                self.position,
                key
            );
        }
    }
}

fn client_of(origin: Origin, kind: &str) -> Option<ClientHandle> {
    match origin {
        Origin::Client(client) => Some(client),
        other => {
            tracing::warn!("{} from {:?} has no client to answer", kind, other);
            None
        }
    }
}
