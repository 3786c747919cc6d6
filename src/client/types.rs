use crate::error::ClientError;
use crate::membership::types::NodeHandle;
use crate::quorum::types::RequestId;
use crate::storage::types::{Key, Version};

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replies a coordinator sends back to the client that issued a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientReply {
    ReadResult { request_id: RequestId, value: String },
    ReadTimeout { request_id: RequestId },
    UpdateResult { request_id: RequestId, version: Version },
    UpdateTimeout { request_id: RequestId },
}

impl ClientReply {
    pub fn request_id(&self) -> &str {
        match self {
            ClientReply::ReadResult { request_id, .. }
            | ClientReply::ReadTimeout { request_id }
            | ClientReply::UpdateResult { request_id, .. }
            | ClientReply::UpdateTimeout { request_id } => request_id,
        }
    }
}

/// Requests handed to the client actor by its owner.
#[derive(Debug)]
pub enum ClientCommand {
    Write {
        coordinator: NodeHandle,
        key: Key,
        value: String,
        respond_to: oneshot::Sender<Result<(), ClientError>>,
    },
    Read {
        coordinator: NodeHandle,
        key: Key,
        respond_to: oneshot::Sender<Result<String, ClientError>>,
    },
    Update {
        coordinator: NodeHandle,
        key: Key,
        value: String,
        respond_to: oneshot::Sender<Result<Version, ClientError>>,
    },
}

/// Everything that can land in a client's mailbox.
#[derive(Debug)]
pub enum ClientEvent {
    Command(ClientCommand),
    Reply(ClientReply),
}

/// Address of a client actor, carried inside client requests so the
/// coordinator knows where to answer.
#[derive(Clone)]
pub struct ClientHandle {
    id: ClientId,
    mailbox: mpsc::UnboundedSender<ClientEvent>,
}

impl ClientHandle {
    pub fn new(id: ClientId, mailbox: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self { id, mailbox }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(ClientId::new(), tx), rx)
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn deliver(&self, reply: ClientReply) -> bool {
        if self.mailbox.send(ClientEvent::Reply(reply)).is_err() {
            tracing::warn!("Client {} is gone, reply dropped", self.id);
            return false;
        }
        true
    }

    pub(crate) fn command(&self, command: ClientCommand) -> bool {
        self.mailbox.send(ClientEvent::Command(command)).is_ok()
    }
}

impl PartialEq for ClientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClientHandle {}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientHandle").field(&self.id.0).finish()
    }
}
