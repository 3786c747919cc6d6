//! End-to-end scenarios against an in-process cluster.
//!
//! All tests run on a paused clock: `settle` only returns once every actor is idle,
//! and quorum or recovery deadlines elapse instantly when nothing else can run.

use ringkv::cluster::harness::Cluster;
use ringkv::config::ClusterConfig;
use ringkv::error::ClientError;
use ringkv::membership::types::Position;
use ringkv::node::types::NodeState;
use ringkv::storage::types::Key;

use std::collections::BTreeSet;
use std::time::Duration;

const FIVE_NODES: [Position; 5] = [10, 20, 30, 40, 50];

/// Positions owning `key` on a ring of `positions` with `replicas` copies.
fn owners(positions: &[Position], key: Key, replicas: usize) -> BTreeSet<Position> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    let start = sorted.iter().position(|p| *p >= key).unwrap_or(0);
    (0..replicas.min(sorted.len()))
        .map(|offset| sorted[(start + offset) % sorted.len()])
        .collect()
}

async fn holders(cluster: &Cluster, key: Key) -> BTreeSet<Position> {
    cluster
        .snapshots()
        .await
        .expect("snapshots")
        .into_iter()
        .filter(|snapshot| snapshot.items.contains_key(&key))
        .map(|snapshot| snapshot.position)
        .collect()
}

async fn seed(cluster: &mut Cluster, keys: &[Key]) {
    let client = cluster.client();
    let coordinator = cluster.node(10).unwrap().clone();
    for &key in keys {
        client
            .write(&coordinator, key, format!("VALUE-{}", key))
            .wait()
            .await
            .unwrap();
    }
    cluster.settle().await;
}

/// Write and update on the reference ring.
#[tokio::test(start_paused = true)]
async fn test_write_then_update_on_reference_ring() {
    let mut cluster = Cluster::bootstrap(ClusterConfig::default(), &FIVE_NODES).unwrap();
    cluster.settle().await;
    let client = cluster.client();

    client.write(cluster.node(10).unwrap(), 25, "X").wait().await.unwrap();
    cluster.settle().await;
    assert_eq!(holders(&cluster, 25).await, BTreeSet::from([30, 40, 50]));

    let version = client.update(cluster.node(20).unwrap(), 25, "Y").wait().await;
    assert_eq!(version, Ok(2));
    cluster.settle().await;

    for position in [30, 40, 50] {
        let snapshot = cluster.snapshot(position).await.unwrap();
        assert_eq!(snapshot.value_of(25), Some("Y"));
        assert_eq!(snapshot.version_of(25), Some(2));
        assert!(snapshot.locked_keys.is_empty());
    }

    let value = client.read(cluster.node(50).unwrap(), 25).wait().await;
    assert_eq!(value, Ok("Y".to_string()));
    cluster.shutdown();
}

/// Successive updates return strictly increasing versions.
#[tokio::test(start_paused = true)]
async fn test_update_versions_are_monotonic() {
    let mut cluster = Cluster::bootstrap(ClusterConfig::default(), &FIVE_NODES).unwrap();
    seed(&mut cluster, &[42]).await;
    let client = cluster.client();

    let mut last = 1;
    for (round, coordinator) in [10, 30, 50, 20].into_iter().enumerate() {
        let version = client
            .update(cluster.node(coordinator).unwrap(), 42, format!("round-{}", round))
            .wait()
            .await
            .unwrap();
        assert!(version > last, "Version {} after {}", version, last);
        last = version;
        cluster.settle().await;
    }
    assert_eq!(last, 5);
    cluster.shutdown();
}

/// With one replica down only two replicas answer, which is not above R = 2.
#[tokio::test(start_paused = true)]
async fn test_read_times_out_without_quorum() {
    let mut cluster = Cluster::bootstrap(ClusterConfig::default(), &FIVE_NODES).unwrap();
    seed(&mut cluster, &[25]).await;
    let client = cluster.client();

    cluster.crash(40).unwrap();
    cluster.settle().await;

    let result = client.read(cluster.node(10).unwrap(), 25).wait().await;
    assert!(matches!(result, Err(ClientError::ReadTimeout(_))));

    let result = client.update(cluster.node(10).unwrap(), 25, "Z").wait().await;
    assert!(matches!(result, Err(ClientError::UpdateTimeout(_))));
    cluster.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_key_read_times_out() {
    let mut cluster = Cluster::bootstrap(ClusterConfig::default(), &FIVE_NODES).unwrap();
    cluster.settle().await;
    let client = cluster.client();

    let result = client.read(cluster.node(20).unwrap(), 33).wait().await;

    assert!(matches!(result, Err(ClientError::ReadTimeout(_))));
    cluster.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_client_is_busy_while_request_outstanding() {
    let mut cluster = Cluster::bootstrap(ClusterConfig::default(), &FIVE_NODES).unwrap();
    seed(&mut cluster, &[25]).await;
    let client = cluster.client();
    let coordinator = cluster.node(10).unwrap().clone();

    let first = client.update(&coordinator, 25, "A");
    let second = client.update(&coordinator, 25, "B");

    assert_eq!(second.wait().await, Err(ClientError::Busy));
    assert_eq!(first.wait().await, Ok(2));
    cluster.shutdown();
}

/// After a join every node holds exactly the keys it replicates on the new ring.
#[tokio::test(start_paused = true)]
async fn test_join_rebalances_ownership() {
    let keys = [5, 15, 25, 33, 35, 38, 45, 55];
    let mut cluster = Cluster::bootstrap(ClusterConfig::default(), &FIVE_NODES).unwrap();
    seed(&mut cluster, &keys).await;

    cluster.join(35, 10).unwrap();
    cluster.settle().await;

    let positions = cluster.positions();
    assert_eq!(positions, vec![10, 20, 30, 35, 40, 50]);
    for snapshot in cluster.snapshots().await.unwrap() {
        assert_eq!(snapshot.ring, positions, "Node {} ring", snapshot.position);
        assert!(!snapshot.joining);
        let expected: BTreeSet<Key> = keys
            .iter()
            .copied()
            .filter(|key| owners(&positions, *key, 3).contains(&snapshot.position))
            .collect();
        let held: BTreeSet<Key> = snapshot.items.keys().copied().collect();
        assert_eq!(held, expected, "Node {} items", snapshot.position);
    }
    cluster.shutdown();
}

/// After a leave the node is gone from every ring and its keys sit with the new owners.
#[tokio::test(start_paused = true)]
async fn test_leave_hands_keys_to_new_owners() {
    let keys = [5, 15, 18, 25, 45];
    let mut cluster = Cluster::bootstrap(ClusterConfig::default(), &FIVE_NODES).unwrap();
    seed(&mut cluster, &keys).await;

    cluster.leave(20).unwrap();
    cluster.settle().await;

    let positions = cluster.positions();
    assert_eq!(positions, vec![10, 30, 40, 50]);
    for snapshot in cluster.snapshots().await.unwrap() {
        assert_eq!(snapshot.ring, positions);
    }
    for key in keys {
        let owners = owners(&positions, key, 3);
        let held = holders(&cluster, key).await;
        assert!(owners.is_subset(&held), "Key {}: owners {:?}, held by {:?}", key, owners, held);
    }

    let departed = cluster.snapshot(20).await.unwrap();
    assert!(departed.items.is_empty());
    cluster.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_crashed_node_ignores_traffic_but_answers_inspect() {
    let mut cluster = Cluster::bootstrap(ClusterConfig::default(), &FIVE_NODES).unwrap();
    cluster.settle().await;

    cluster.crash(30).unwrap();
    seed(&mut cluster, &[27]).await;

    assert_eq!(holders(&cluster, 27).await, BTreeSet::from([40, 50]));
    let crashed = cluster.snapshot(30).await.unwrap();
    assert_eq!(crashed.state, NodeState::Crashed);
    cluster.shutdown();
}

/// A recovered node catches up with updates it missed while crashed.
#[tokio::test(start_paused = true)]
async fn test_recovery_catches_up_missed_updates() {
    let config = ClusterConfig::new(5, 3, 3, Duration::from_millis(500));
    let positions = [10, 20, 30, 40, 50, 60, 70];
    let mut cluster = Cluster::bootstrap(config, &positions).unwrap();
    seed(&mut cluster, &[25, 27]).await;
    let client = cluster.client();

    cluster.crash(30).unwrap();
    cluster.settle().await;
    let version = client.update(cluster.node(10).unwrap(), 25, "missed").wait().await;
    assert_eq!(version, Ok(2));
    cluster.settle().await;
    assert_eq!(cluster.snapshot(30).await.unwrap().version_of(25), Some(1));

    cluster.recover(30, 60).unwrap();
    cluster.settle().await;
    assert_eq!(cluster.snapshot(30).await.unwrap().state, NodeState::Crashed);

    tokio::time::sleep(config.timeout + Duration::from_millis(10)).await;

    let recovered = cluster.snapshot(30).await.unwrap();
    assert_eq!(recovered.state, NodeState::Active);
    assert_eq!(recovered.value_of(25), Some("missed"));
    assert_eq!(recovered.version_of(25), Some(2));
    assert_eq!(recovered.version_of(27), Some(1));
    cluster.shutdown();
}
