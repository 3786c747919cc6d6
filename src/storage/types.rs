use serde::{Deserialize, Serialize};

/// Data key. Shares its integer space with ring positions.
pub type Key = u32;

/// Per-key version number, starting at 1.
pub type Version = u32;

/// Identifies one acquisition of a per-key lock.
pub type LockToken = u64;

/// A stored value together with its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    pub value: String,
    pub version: Version,
}

impl DataItem {
    /// A freshly created item (version 1).
    pub fn new(value: impl Into<String>) -> Self {
        Self::with_version(value, 1)
    }

    pub fn with_version(value: impl Into<String>, version: Version) -> Self {
        Self {
            value: value.into(),
            version,
        }
    }

    /// Last-writer-wins comparison: strictly higher version.
    pub fn is_newer_than(&self, other: &DataItem) -> bool {
        self.version > other.version
    }
}
