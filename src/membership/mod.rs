//! Ring & Membership Module
//!
//! Maps keys onto the nodes responsible for them using a consistent-hash style ring.
//! Node positions and keys share one integer space; a key belongs to the first node
//! whose position is at or after it and to the next `N - 1` nodes clockwise.
//!
//! ## Core Concepts
//! - **Local views**: every node owns its own `Ring`. There is no shared copy.
//! - **Replica sets**: `find_replicas` is the only ownership function; reads, writes,
//!   updates and hand-offs all route through it.
//! - **Neighbors**: `find_neighbors` returns a superset of possible holders, used when
//!   a recovering node does not know who currently stores its data.

pub mod ring;
pub mod types;

#[cfg(test)]
mod tests;
