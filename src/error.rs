//! Error Types
//!
//! None of these errors is fatal. Node-local errors are logged and the triggering
//! message goes unanswered; the coordinator only ever sees a missing vote.

use crate::membership::types::Position;
use crate::storage::types::Key;
use thiserror::Error;

/// Rejections produced by a node's local store when a probe cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Read or version probe for a key this node does not hold.
    #[error("unknown key {0}")]
    UnknownKey(Key),

    /// Read or version probe for a key locked by an in-flight update.
    #[error("key {0} is locked by an in-flight update")]
    LockedKey(Key),

    /// Plain write targeting a key that already exists locally.
    #[error("key {0} already exists")]
    ExistingKey(Key),
}

/// What a client call resolves to when no value comes back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("client is busy with another request")]
    Busy,

    #[error("read {0} timed out before a quorum was reached")]
    ReadTimeout(String),

    #[error("update {0} timed out before a quorum was reached")]
    UpdateTimeout(String),

    #[error("client mailbox closed")]
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    #[error("ring position {0} is already taken")]
    DuplicatePosition(Position),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("replicas, write quorum and read quorum must all be positive")]
    ZeroValue,

    /// Quorum fires on threshold + 1 matching votes, so the threshold must stay below N.
    #[error("{name} quorum {quorum} must be smaller than the replica count {replicas}")]
    QuorumTooLarge {
        name: &'static str,
        quorum: usize,
        replicas: usize,
    },

    #[error("read quorum {read} + write quorum {write} must exceed the replica count {replicas}")]
    NoOverlap {
        read: usize,
        write: usize,
        replicas: usize,
    },

    #[error("write quorum {write} must exceed half of the replica count {replicas}")]
    WriteMajority { write: usize, replicas: usize },

    #[error("request timeout must be positive")]
    ZeroTimeout,

    #[error("{nodes} nodes cannot hold {replicas} replicas")]
    NotEnoughNodes { nodes: usize, replicas: usize },

    #[error(transparent)]
    Ring(#[from] RingError),
}
