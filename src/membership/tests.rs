//! Membership Module Tests
//!
//! Validates ring maintenance and the routing functions built on top of it.
//!
//! ## Test Scopes
//! - **Identity**: NodeId uniqueness and handle equality.
//! - **Ring maintenance**: sorted merging, duplicate detection, removal and replacement.
//! - **Routing**: replica sets with wraparound, neighbor sets and clockwise successors.

#[cfg(test)]
mod tests {
    use crate::error::RingError;
    use crate::membership::ring::Ring;
    use crate::membership::types::{NodeHandle, NodeId, Position, RingEntry};
    use std::collections::HashSet;

    fn ring_with(replicas: usize, positions: &[Position]) -> (Ring, Vec<RingEntry>) {
        let entries: Vec<RingEntry> = positions
            .iter()
            .map(|&position| RingEntry::new(position, NodeHandle::channel().0))
            .collect();
        let mut ring = Ring::new(replicas);
        ring.add_nodes(entries.clone()).unwrap();
        (ring, entries)
    }

    fn handle_at(entries: &[RingEntry], position: Position) -> NodeHandle {
        entries
            .iter()
            .find(|entry| entry.position == position)
            .map(|entry| entry.handle.clone())
            .unwrap()
    }

    // ============================================================
    // NODE ID / HANDLE TESTS
    // ============================================================

    #[test]
    fn test_node_id_is_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();

        assert_ne!(id1, id2, "Each NodeId should be unique");
    }

    #[test]
    fn test_handles_compare_by_id() {
        let (handle, _rx) = NodeHandle::channel();
        let clone = handle.clone();
        let (other, _rx2) = NodeHandle::channel();

        assert_eq!(handle, clone);
        assert_ne!(handle, other);

        let mut set = HashSet::new();
        set.insert(handle);
        set.insert(clone);
        set.insert(other);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_node_id_serialization() {
        let id = NodeId("node-42".to_string());
        let json = serde_json::to_string(&id).expect("Serialization failed");
        let restored: NodeId = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(restored, id);
    }

    // ============================================================
    // RING MAINTENANCE TESTS
    // ============================================================

    #[test]
    fn test_add_nodes_keeps_ring_sorted() {
        let (ring, _) = ring_with(3, &[40, 10, 50, 30, 20]);
        assert_eq!(ring.positions(), vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_add_nodes_rejects_duplicate_position() {
        let (mut ring, _) = ring_with(3, &[10, 20, 30]);
        let intruder = RingEntry::new(20, NodeHandle::channel().0);

        let result = ring.add_node(intruder);

        assert_eq!(result, Err(RingError::DuplicatePosition(20)));
        assert_eq!(ring.positions(), vec![10, 20, 30], "Ring must be untouched");
    }

    #[test]
    fn test_add_nodes_is_idempotent_for_same_entry() {
        let (mut ring, entries) = ring_with(3, &[10, 20, 30]);
        ring.add_nodes(entries).unwrap();
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_remove_node() {
        let (mut ring, entries) = ring_with(3, &[10, 20, 30, 40]);
        let victim = handle_at(&entries, 30);

        ring.remove_node(victim.id());

        assert_eq!(ring.positions(), vec![10, 20, 40]);
        assert!(!ring.contains(victim.id()));
    }

    #[test]
    fn test_replace_discards_old_view() {
        let (mut ring, _) = ring_with(3, &[10, 20, 30]);
        let (_, fresh) = ring_with(3, &[15, 25]);

        ring.replace(fresh).unwrap();

        assert_eq!(ring.positions(), vec![15, 25]);
    }

    // ============================================================
    // ROUTING TESTS
    // ============================================================

    #[test]
    fn test_find_replicas_uses_first_position_at_or_after_key() {
        let (ring, entries) = ring_with(3, &[10, 20, 30, 40, 50]);

        let replicas = ring.find_replicas(25);

        let expected: Vec<NodeHandle> = [30, 40, 50].iter().map(|&p| handle_at(&entries, p)).collect();
        assert_eq!(replicas, expected);
    }

    #[test]
    fn test_find_replicas_exact_position_owns_key() {
        let (ring, entries) = ring_with(3, &[10, 20, 30, 40, 50]);

        let replicas = ring.find_replicas(50);

        let expected: Vec<NodeHandle> = [50, 10, 20].iter().map(|&p| handle_at(&entries, p)).collect();
        assert_eq!(replicas, expected);
    }

    #[test]
    fn test_find_replicas_wraps_past_maximum() {
        let (ring, entries) = ring_with(3, &[10, 20, 30, 40, 50]);

        let replicas = ring.find_replicas(55);

        let expected: Vec<NodeHandle> = [10, 20, 30].iter().map(|&p| handle_at(&entries, p)).collect();
        assert_eq!(replicas, expected);
    }

    #[test]
    fn test_find_replicas_always_distinct_and_contiguous() {
        let positions = [7, 19, 33, 48, 61, 90, 120];
        let (ring, entries) = ring_with(3, &positions);

        for key in 0..150 {
            let replicas = ring.find_replicas(key);
            assert_eq!(replicas.len(), 3, "key {} must map to 3 replicas", key);

            let distinct: HashSet<_> = replicas.iter().collect();
            assert_eq!(distinct.len(), 3, "key {} got duplicate replicas", key);

            let first = entries.iter().position(|entry| entry.handle == replicas[0]).unwrap();
            for (offset, handle) in replicas.iter().enumerate() {
                assert_eq!(&entries[(first + offset) % entries.len()].handle, handle);
            }
        }
    }

    #[test]
    fn test_find_replicas_on_small_ring() {
        let (ring, _) = ring_with(3, &[10, 20]);
        assert_eq!(ring.find_replicas(15).len(), 2);

        let empty = Ring::new(3);
        assert!(empty.find_replicas(15).is_empty());
    }

    #[test]
    fn test_find_neighbors_returns_successors_then_predecessors() {
        let (ring, entries) = ring_with(2, &[10, 20, 30, 40, 50, 60]);

        let neighbors = ring.find_neighbors(30);

        let expected: Vec<NodeHandle> = [30, 40, 20, 10].iter().map(|&p| handle_at(&entries, p)).collect();
        assert_eq!(neighbors, expected);
    }

    #[test]
    fn test_find_neighbors_deduplicates_on_small_ring() {
        let (ring, _) = ring_with(3, &[10, 20, 30, 40]);

        let neighbors = ring.find_neighbors(20);

        assert_eq!(neighbors.len(), 4);
    }

    #[test]
    fn test_clockwise_neighbor() {
        let (ring, entries) = ring_with(3, &[10, 20, 30]);

        assert_eq!(ring.clockwise_neighbor(10), Some(handle_at(&entries, 20)));
        assert_eq!(ring.clockwise_neighbor(25), Some(handle_at(&entries, 30)));
        assert_eq!(ring.clockwise_neighbor(30), Some(handle_at(&entries, 10)));
        assert_eq!(Ring::new(3).clockwise_neighbor(30), None);
    }

    #[test]
    fn test_is_replica() {
        let (ring, entries) = ring_with(3, &[10, 20, 30, 40, 50]);
        let node_10 = handle_at(&entries, 10);

        assert!(ring.is_replica(5, node_10.id()));
        assert!(ring.is_replica(45, node_10.id()));
        assert!(!ring.is_replica(15, node_10.id()));
    }
}
