use crate::client::types::ClientHandle;
use crate::storage::types::{Key, Version};

use std::collections::HashMap;

/// Opaque request identifier chosen by the client.
pub type RequestId = String;

/// Result of recording one replica response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// No quorum yet, or the request is no longer tracked.
    None,
    Quorum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Update { key: Key, value: String },
}

/// Vote bookkeeping for one in-flight request on its coordinator.
#[derive(Debug)]
pub struct PendingRequest {
    pub request_id: RequestId,
    pub client: ClientHandle,
    pub kind: RequestKind,
    pub quorum_threshold: usize,
    pub(super) votes_by_version: HashMap<Version, usize>,
    pub(super) values_by_version: HashMap<Version, String>,
    pub(super) highest_version: Option<Version>,
    pub(super) agreed_version: Option<Version>,
}

impl PendingRequest {
    pub(super) fn new(
        request_id: RequestId,
        client: ClientHandle,
        kind: RequestKind,
        quorum_threshold: usize,
    ) -> Self {
        Self {
            request_id,
            client,
            kind,
            quorum_threshold,
            votes_by_version: HashMap::new(),
            values_by_version: HashMap::new(),
            highest_version: None,
            agreed_version: None,
        }
    }

    pub fn votes_for(&self, version: Version) -> usize {
        self.votes_by_version.get(&version).copied().unwrap_or(0)
    }

    pub fn total_votes(&self) -> usize {
        self.votes_by_version.values().sum()
    }

    pub fn has_quorum(&self) -> bool {
        self.agreed_version.is_some()
    }

    /// Counts one vote; the version wins once its count strictly exceeds the threshold.
    pub(super) fn count(&mut self, version: Version) -> VoteOutcome {
        if self.agreed_version.is_some() {
            return VoteOutcome::None;
        }

        let votes = self.votes_by_version.entry(version).or_insert(0);
        *votes += 1;
        let reached = *votes > self.quorum_threshold;

        self.highest_version = Some(self.highest_version.map_or(version, |v| v.max(version)));

        if reached {
            self.agreed_version = Some(version);
            VoteOutcome::Quorum
        } else {
            VoteOutcome::None
        }
    }
}

/// Final outcome of a request that reached its quorum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Read {
        request_id: RequestId,
        client: ClientHandle,
        value: String,
    },
    Update {
        request_id: RequestId,
        client: ClientHandle,
        key: Key,
        value: String,
        /// Version to install on every replica.
        version: Version,
    },
}
