//! Data Node Module
//!
//! The per-node protocol engine. Each node is a tokio task owning its store, its ring
//! view and its in-flight request state, reachable only through its mailbox.
//!
//! ## Core Concepts
//! - **States**: `Active` serves every protocol path; `Crashed` discards everything but
//!   the recovery sub-protocol and `Inspect`.
//! - **Coordinator**: whichever node receives a client request drives its quorum.
//! - **Timers**: delayed messages posted back into the node's own mailbox. They are never
//!   cancelled; each handler checks whether the state it targets still exists.
//!
//! ## Submodules
//! - **`protocol`**: the message catalogue and envelope.
//! - **`engine`**: the `DataNode` actor and its per-state dispatch.
//! - **`requests`**: plain write, quorum read and two-phase update.
//! - **`lifecycle`**: join, leave, crash and recovery.
//! - **`timer`**: self-addressed delayed messages.

pub mod engine;
mod lifecycle;
pub mod protocol;
mod requests;
pub mod timer;
pub mod types;
