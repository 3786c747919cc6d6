use crate::node::protocol::{Envelope, Message, Origin};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use tokio::sync::mpsc;

/// Position on the ring. Keys live in the same space.
pub type Position = u32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of a data node: its identity plus the sending half of its mailbox.
///
/// Two handles are the same node iff their ids match.
#[derive(Clone)]
pub struct NodeHandle {
    id: NodeId,
    mailbox: mpsc::UnboundedSender<Envelope>,
}

impl NodeHandle {
    pub fn new(id: NodeId, mailbox: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { id, mailbox }
    }

    /// Creates a handle together with the receiving end of its mailbox.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(NodeId::new(), tx), rx)
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Posts a message into the node's mailbox. Returns `false` if the node is gone.
    pub fn send(&self, origin: Origin, message: Message) -> bool {
        match self.mailbox.send(Envelope { origin, message }) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Mailbox of node {} is closed, dropping {}",
                    self.id,
                    e.0.message.kind()
                );
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeHandle {}

impl Hash for NodeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeHandle").field(&self.id.0).finish()
    }
}

/// A single member of a node's ring view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingEntry {
    pub position: Position,
    pub handle: NodeHandle,
}

impl RingEntry {
    pub fn new(position: Position, handle: NodeHandle) -> Self {
        Self { position, handle }
    }
}
