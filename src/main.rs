use anyhow::Context;
use clap::Parser;
use ringkv::cluster::harness::Cluster;
use ringkv::config::{
    ClusterConfig, DEFAULT_READ_QUORUM, DEFAULT_REPLICAS, DEFAULT_WRITE_QUORUM,
};
use ringkv::membership::types::Position;
use std::time::Duration;

/// Runs a scripted scenario against an in-process cluster and prints node snapshots.
#[derive(Parser, Debug)]
#[command(name = "ringkv", version, about)]
struct Args {
    /// Replica count (N)
    #[arg(short = 'n', long, default_value_t = DEFAULT_REPLICAS)]
    replicas: usize,

    /// Write quorum threshold (W)
    #[arg(short = 'w', long, default_value_t = DEFAULT_WRITE_QUORUM)]
    write_quorum: usize,

    /// Read quorum threshold (R)
    #[arg(short = 'r', long, default_value_t = DEFAULT_READ_QUORUM)]
    read_quorum: usize,

    /// Request, lock and recovery timeout in milliseconds
    #[arg(short = 't', long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Number of initial nodes, placed at positions 10, 20, 30, ...
    #[arg(long, default_value_t = 5)]
    nodes: u32,

    /// Random items seeded before the scenario starts
    #[arg(long, default_value_t = 6)]
    seed_items: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ClusterConfig::new(
        args.replicas,
        args.write_quorum,
        args.read_quorum,
        Duration::from_millis(args.timeout_ms),
    );
    let positions: Vec<Position> = (1..=args.nodes).map(|i| i * 10).collect();
    let max_position = positions.last().copied().unwrap_or(10);

    let mut cluster = Cluster::bootstrap(config, &positions).context("invalid cluster setup")?;
    cluster.settle().await;

    // 1. Seed data:
    cluster.seed_random(args.seed_items, max_position + 10);
    cluster.settle().await;

    // 2. Plain write, update and read through different coordinators:
    let client = cluster.client();
    let first = cluster.node(positions[0])?.clone();
    let last = cluster.node(max_position)?.clone();
    let key = max_position / 2;

    client.write(&first, key, "X").wait().await?;
    cluster.settle().await;
    match client.update(&last, key, "Y").wait().await {
        Ok(version) => tracing::info!("Update of key {} committed at version {}", key, version),
        Err(e) => tracing::warn!("Update of key {} failed: {}", key, e),
    }
    cluster.settle().await;
    match client.read(&first, key).wait().await {
        Ok(value) => tracing::info!("Read of key {} returned \"{}\"", key, value),
        Err(e) => tracing::warn!("Read of key {} failed: {}", key, e),
    }

    // 3. Membership changes:
    let joiner = positions[0] + 5;
    if !positions.contains(&joiner) {
        cluster.join(joiner, positions[0])?;
        cluster.settle().await;
    }
    cluster.leave(positions[0])?;
    cluster.settle().await;

    // 4. Crash and recovery:
    let victim = max_position;
    let helper = cluster
        .positions()
        .into_iter()
        .find(|p| *p != victim)
        .context("no helper node left")?;
    cluster.crash(victim)?;
    cluster.settle().await;
    cluster.recover(victim, helper)?;
    tokio::time::sleep(config.timeout + Duration::from_millis(100)).await;

    // 5. Report:
    cluster.status(helper)?;
    cluster.settle().await;
    for snapshot in cluster.snapshots().await? {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    cluster.shutdown();
    Ok(())
}
