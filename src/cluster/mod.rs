//! Cluster Module
//!
//! Wires up an in-process cluster: spawns data nodes at fixed ring positions, hands them
//! the initial ring and exposes the operator commands (join, leave, crash, recover,
//! status) plus snapshot queries used by the binary and the integration tests.

pub mod harness;
