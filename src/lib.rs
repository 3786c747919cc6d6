//! Replicated Partitioned Key-Value Store
//!
//! A Dynamo-style store running as in-process actors: keys live on a ring, each key is
//! held by N consecutive nodes, and any node can coordinate a client request with
//! tunable read and write quorums.
//!
//! ## Architecture Modules
//! - **`membership`**: node identities, handles and the per-node ring view with its
//!   routing functions (replicas, neighbors, clockwise successor).
//! - **`storage`**: the per-node versioned store with per-key update locks.
//! - **`quorum`**: coordinator-side vote accounting for reads and updates.
//! - **`handoff`**: data collection while a node joins.
//! - **`node`**: the data node actor implementing write, read, update, join, leave,
//!   crash and recovery.
//! - **`client`**: the client actor with its single-outstanding-request discipline.
//! - **`cluster`**: bootstrap and operator commands for an in-process cluster.
//! - **`config`** / **`error`**: quorum configuration and error types.

pub mod client;
pub mod cluster;
pub mod config;
pub mod error;
pub mod handoff;
pub mod membership;
pub mod node;
pub mod quorum;
pub mod storage;
