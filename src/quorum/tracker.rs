use super::types::{PendingRequest, RequestId, RequestKind, Resolution, VoteOutcome};
use crate::client::types::ClientHandle;
use crate::storage::types::{Key, Version};

use std::collections::HashMap;

/// In-flight quorum requests of one coordinator, keyed by request id.
///
/// A record lives from registration until it either resolves or is discarded on
/// timeout. Any later vote or timer for that id finds nothing and is a no-op.
#[derive(Debug, Default)]
pub struct QuorumTracker {
    requests: HashMap<RequestId, PendingRequest>,
}

impl QuorumTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a read. Returns `false` if the id is already tracked.
    pub fn new_read(&mut self, request_id: RequestId, client: ClientHandle, quorum_threshold: usize) -> bool {
        self.register(request_id, client, RequestKind::Read, quorum_threshold)
    }

    /// Registers an update of `key` to `value`. Returns `false` if the id is already tracked.
    pub fn new_write(
        &mut self,
        request_id: RequestId,
        client: ClientHandle,
        quorum_threshold: usize,
        key: Key,
        value: String,
    ) -> bool {
        self.register(request_id, client, RequestKind::Update { key, value }, quorum_threshold)
    }

    fn register(
        &mut self,
        request_id: RequestId,
        client: ClientHandle,
        kind: RequestKind,
        quorum_threshold: usize,
    ) -> bool {
        if self.requests.contains_key(&request_id) {
            tracing::warn!("Request {} is already pending, ignoring duplicate", request_id);
            return false;
        }
        let pending = PendingRequest::new(request_id.clone(), client, kind, quorum_threshold);
        self.requests.insert(request_id, pending);
        true
    }

    pub fn record_read_vote(&mut self, request_id: &str, version: Version, value: String) -> VoteOutcome {
        let Some(pending) = self.requests.get_mut(request_id) else {
            tracing::debug!("Late read reply for {} ignored", request_id);
            return VoteOutcome::None;
        };
        if pending.kind != RequestKind::Read {
            tracing::warn!("Read reply for non-read request {}", request_id);
            return VoteOutcome::None;
        }
        pending.values_by_version.entry(version).or_insert(value);
        pending.count(version)
    }

    pub fn record_write_vote(&mut self, request_id: &str, version: Version) -> VoteOutcome {
        let Some(pending) = self.requests.get_mut(request_id) else {
            tracing::debug!("Late version reply for {} ignored", request_id);
            return VoteOutcome::None;
        };
        if pending.kind == RequestKind::Read {
            tracing::warn!("Version reply for read request {}", request_id);
            return VoteOutcome::None;
        }
        pending.count(version)
    }

    /// True while the request is still tracked, i.e. its quorum never arrived.
    pub fn still_pending(&self, request_id: &str) -> bool {
        self.requests.contains_key(request_id)
    }

    pub fn get(&self, request_id: &str) -> Option<&PendingRequest> {
        self.requests.get(request_id)
    }

    /// Removes a request that reached quorum and returns its outcome.
    ///
    /// Requests without a quorum stay tracked and yield `None`.
    pub fn resolve_and_remove(&mut self, request_id: &str) -> Option<Resolution> {
        if !self.requests.get(request_id)?.has_quorum() {
            return None;
        }
        let pending = self.requests.remove(request_id)?;
        let agreed = pending.agreed_version?;

        match pending.kind {
            RequestKind::Read => {
                let value = pending.values_by_version.get(&agreed).cloned()?;
                Some(Resolution::Read {
                    request_id: pending.request_id,
                    client: pending.client,
                    value,
                })
            }
            RequestKind::Update { key, value } => {
                let highest = pending.highest_version.unwrap_or(agreed).max(agreed);
                Some(Resolution::Update {
                    request_id: pending.request_id,
                    client: pending.client,
                    key,
                    value,
                    version: highest + 1,
                })
            }
        }
    }

    /// Drops a request regardless of its votes (timeout path).
    pub fn discard(&mut self, request_id: &str) -> Option<PendingRequest> {
        self.requests.remove(request_id)
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
