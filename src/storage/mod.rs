//! Local Storage Module
//!
//! Implements the per-node versioned key-value map.
//!
//! ## Core Concepts
//! - **Versions**: every item carries an integer version; the first write creates version 1.
//! - **Locks**: a key answering a version probe during an update is locked until the
//!   commit arrives or its safety timer fires. Locked keys refuse reads and further probes.
//! - **Merging**: hand-off and recovery install data with different policies
//!   (unconditional, insert-if-absent, newest-version-wins).

pub mod memory;
pub mod types;
