use crate::client::actor::Client;
use crate::client::types::ClientHandle;
use crate::config::ClusterConfig;
use crate::error::{ConfigError, RingError};
use crate::membership::types::{NodeHandle, Position, RingEntry};
use crate::node::engine::DataNode;
use crate::node::protocol::{Message, Origin};
use crate::node::types::NodeSnapshot;
use crate::storage::types::Key;

use anyhow::{Context, Result, anyhow};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Pause long enough for message cascades between in-process actors to drain.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Operator-side view of an in-process cluster.
///
/// Owns every node and client task it spawned. Commands are posted with
/// `Origin::Operator` and return as soon as they are enqueued.
pub struct Cluster {
    config: ClusterConfig,
    members: BTreeMap<Position, NodeHandle>,
    departed: BTreeMap<Position, NodeHandle>,
    tasks: Vec<JoinHandle<()>>,
}

impl Cluster {
    /// Spawns one node per position and hands every node the full ring.
    pub fn bootstrap(config: ClusterConfig, positions: &[Position]) -> Result<Self, ConfigError> {
        config.validate()?;
        if positions.len() < config.replicas {
            return Err(ConfigError::NotEnoughNodes {
                nodes: positions.len(),
                replicas: config.replicas,
            });
        }
        let mut seen = BTreeSet::new();
        for &position in positions {
            if !seen.insert(position) {
                return Err(RingError::DuplicatePosition(position).into());
            }
        }

        let mut cluster = Self {
            config,
            members: BTreeMap::new(),
            departed: BTreeMap::new(),
            tasks: Vec::new(),
        };
        for &position in positions {
            cluster.spawn_node(position);
        }

        let entries: Vec<RingEntry> = cluster
            .members
            .iter()
            .map(|(position, handle)| RingEntry::new(*position, handle.clone()))
            .collect();
        for handle in cluster.members.values() {
            handle.send(
                Origin::Operator,
                Message::InitializeGroup {
                    entries: entries.clone(),
                },
            );
        }

        tracing::info!(
            "Cluster bootstrapped with {} nodes at {:?} (N={}, W={}, R={})",
            positions.len(),
            cluster.positions(),
            config.replicas,
            config.write_quorum,
            config.read_quorum
        );
        Ok(cluster)
    }

    fn spawn_node(&mut self, position: Position) -> NodeHandle {
        let (handle, task) = DataNode::spawn(position, self.config);
        self.members.insert(position, handle.clone());
        self.tasks.push(task);
        handle
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn positions(&self) -> Vec<Position> {
        self.members.keys().copied().collect()
    }

    pub fn node(&self, position: Position) -> Result<&NodeHandle> {
        self.members
            .get(&position)
            .ok_or_else(|| anyhow!("no node at position {}", position))
    }

    /// Spawns a client actor owned by this cluster.
    pub fn client(&mut self) -> ClientHandle {
        let (handle, task) = Client::spawn();
        self.tasks.push(task);
        handle
    }

    /// Starts a new node at `position` and lets it join through `bootstrap`.
    pub fn join(&mut self, position: Position, bootstrap: Position) -> Result<NodeHandle> {
        if self.members.contains_key(&position) {
            return Err(RingError::DuplicatePosition(position).into());
        }
        let bootstrap = self.node(bootstrap)?.clone();
        let handle = self.spawn_node(position);
        handle.send(Origin::Operator, Message::AskToJoin { bootstrap });
        tracing::info!("Operator: node {} asked to join", position);
        Ok(handle)
    }

    pub fn leave(&mut self, position: Position) -> Result<()> {
        let handle = self
            .members
            .remove(&position)
            .ok_or_else(|| anyhow!("no node at position {}", position))?;
        handle.send(Origin::Operator, Message::AskToLeave);
        self.departed.insert(position, handle);
        tracing::info!("Operator: node {} asked to leave", position);
        Ok(())
    }

    pub fn crash(&self, position: Position) -> Result<()> {
        self.node(position)?.send(Origin::Operator, Message::AskCrash);
        tracing::info!("Operator: node {} crashed", position);
        Ok(())
    }

    pub fn recover(&self, position: Position, helper: Position) -> Result<()> {
        let helper = self.node(helper)?.clone();
        self.node(position)?
            .send(Origin::Operator, Message::AskRecover { helper });
        tracing::info!("Operator: node {} asked to recover", position);
        Ok(())
    }

    /// Makes every ring member known to `position` log its items.
    pub fn status(&self, position: Position) -> Result<()> {
        self.node(position)?.send(Origin::Operator, Message::AskStatus);
        Ok(())
    }

    pub async fn snapshot(&self, position: Position) -> Result<NodeSnapshot> {
        let handle = self
            .members
            .get(&position)
            .or_else(|| self.departed.get(&position))
            .ok_or_else(|| anyhow!("no node at position {}", position))?;

        let (respond_to, rx) = oneshot::channel();
        handle.send(Origin::Operator, Message::Inspect { respond_to });
        rx.await
            .with_context(|| format!("node {} did not answer inspect", position))
    }

    /// Snapshots of every current member, in ring order.
    pub async fn snapshots(&self) -> Result<Vec<NodeSnapshot>> {
        let mut snapshots = Vec::with_capacity(self.members.len());
        for position in self.positions() {
            snapshots.push(self.snapshot(position).await?);
        }
        Ok(snapshots)
    }

    /// Seeds `count` distinct random keys below `key_space` through random
    /// coordinators with plain writes. Returns the written pairs.
    pub fn seed_random(&self, count: usize, key_space: Key) -> Vec<(Key, String)> {
        let coordinators: Vec<&NodeHandle> = self.members.values().collect();
        if coordinators.is_empty() || key_space == 0 {
            return Vec::new();
        }

        let mut rng = rand::thread_rng();
        let mut keys = BTreeSet::new();
        while keys.len() < count.min(key_space as usize) {
            keys.insert(rng.gen_range(0..key_space));
        }

        let mut written = Vec::with_capacity(keys.len());
        for key in keys {
            let value = format!("VALUE-{}", key);
            if let Some(coordinator) = coordinators.choose(&mut rng) {
                coordinator.send(
                    Origin::Operator,
                    Message::AskWrite {
                        key,
                        value: value.clone(),
                    },
                );
            }
            written.push((key, value));
        }
        tracing::info!("Seeded {} random items", written.len());
        written
    }

    /// Yields until in-flight messages have been processed.
    pub async fn settle(&self) {
        tokio::time::sleep(SETTLE_DELAY).await;
    }

    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        tracing::info!("Cluster shut down ({} tasks)", self.tasks.len());
    }
}
