//! Cluster Configuration
//!
//! Replica count, quorum sizes and the single deadline used for read, update,
//! lock-safety and recovery timers.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REPLICAS: usize = 3;
pub const DEFAULT_WRITE_QUORUM: usize = 2;
pub const DEFAULT_READ_QUORUM: usize = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of nodes holding a copy of each key (N).
    pub replicas: usize,
    /// Write quorum threshold (W).
    pub write_quorum: usize,
    /// Read quorum threshold (R).
    pub read_quorum: usize,
    /// Deadline for quorum requests, per-key locks and recovery.
    pub timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            write_quorum: DEFAULT_WRITE_QUORUM,
            read_quorum: DEFAULT_READ_QUORUM,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClusterConfig {
    pub fn new(replicas: usize, write_quorum: usize, read_quorum: usize, timeout: Duration) -> Self {
        Self {
            replicas,
            write_quorum,
            read_quorum,
            timeout,
        }
    }

    /// Checks the quorum arithmetic.
    ///
    /// A quorum is declared once the votes for one version strictly exceed the
    /// threshold, so both thresholds must be below `replicas` to ever be met.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (n, w, r) = (self.replicas, self.write_quorum, self.read_quorum);

        if n == 0 || w == 0 || r == 0 {
            return Err(ConfigError::ZeroValue);
        }
        if w >= n {
            return Err(ConfigError::QuorumTooLarge {
                name: "write",
                quorum: w,
                replicas: n,
            });
        }
        if r >= n {
            return Err(ConfigError::QuorumTooLarge {
                name: "read",
                quorum: r,
                replicas: n,
            });
        }
        if r + w <= n {
            return Err(ConfigError::NoOverlap {
                read: r,
                write: w,
                replicas: n,
            });
        }
        if 2 * w <= n {
            return Err(ConfigError::WriteMajority {
                write: w,
                replicas: n,
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }
}
