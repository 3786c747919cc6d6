//! Hand-off Module
//!
//! Transient state held by a node while it joins the ring.
//!
//! ## Core Concepts
//! - **Key set**: every key the clockwise neighbor holds, i.e. the superset of what
//!   the joining node may become responsible for.
//! - **Best-known item**: per key, the highest-version copy seen among the replies.
//! - **Acknowledgments**: a key is settled once every current replica has answered.

pub mod tracker;
