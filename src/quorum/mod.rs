//! Quorum Tracking Module
//!
//! Coordinator-side accounting for reads and updates that are waiting on replica replies.
//!
//! ## Lifecycle
//! `WAITING -> {QUORUM_REACHED, DISCARDED}`. Both end states remove the record, and any
//! message arriving afterwards for the same request id is silently ignored: late replies
//! and late timers are routine, not errors.
//!
//! ## Counting
//! Votes are grouped by version number. A version reaches quorum when its vote count
//! strictly exceeds the configured threshold, so a threshold of `R` needs `R + 1`
//! agreeing replicas.

pub mod tracker;
pub mod types;
