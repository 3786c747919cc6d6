use super::types::{ClientCommand, ClientEvent, ClientHandle, ClientReply};
use crate::error::ClientError;
use crate::membership::types::NodeHandle;
use crate::node::protocol::{Message, Origin};
use crate::quorum::types::RequestId;
use crate::storage::types::{Key, Version};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Result of a client call, resolved once the client actor settles it.
#[must_use = "a pending call does nothing unless waited on"]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, ClientError>>,
}

impl<T> Pending<T> {
    pub async fn wait(self) -> Result<T, ClientError> {
        self.rx.await.unwrap_or(Err(ClientError::Disconnected))
    }
}

impl ClientHandle {
    /// Seeds `key` through `coordinator`. Fire-and-forget: resolves as soon as the
    /// request is sent.
    pub fn write(&self, coordinator: &NodeHandle, key: Key, value: impl Into<String>) -> Pending<()> {
        let (respond_to, rx) = oneshot::channel();
        self.command(ClientCommand::Write {
            coordinator: coordinator.clone(),
            key,
            value: value.into(),
            respond_to,
        });
        Pending { rx }
    }

    pub fn read(&self, coordinator: &NodeHandle, key: Key) -> Pending<String> {
        let (respond_to, rx) = oneshot::channel();
        self.command(ClientCommand::Read {
            coordinator: coordinator.clone(),
            key,
            respond_to,
        });
        Pending { rx }
    }

    pub fn update(&self, coordinator: &NodeHandle, key: Key, value: impl Into<String>) -> Pending<Version> {
        let (respond_to, rx) = oneshot::channel();
        self.command(ClientCommand::Update {
            coordinator: coordinator.clone(),
            key,
            value: value.into(),
            respond_to,
        });
        Pending { rx }
    }
}

enum Outstanding {
    Read {
        request_id: RequestId,
        respond_to: oneshot::Sender<Result<String, ClientError>>,
    },
    Update {
        request_id: RequestId,
        respond_to: oneshot::Sender<Result<Version, ClientError>>,
    },
}

impl Outstanding {
    fn request_id(&self) -> &str {
        match self {
            Outstanding::Read { request_id, .. } | Outstanding::Update { request_id, .. } => {
                request_id
            }
        }
    }
}

/// Client actor: packages requests for a coordinator and waits for the answer.
///
/// At most one read or update is outstanding at a time; anything issued while
/// busy resolves to [`ClientError::Busy`].
pub struct Client {
    handle: ClientHandle,
    counter: u64,
    outstanding: Option<Outstanding>,
}

impl Client {
    pub fn new(handle: ClientHandle) -> Self {
        Self {
            handle,
            counter: 0,
            outstanding: None,
        }
    }

    pub fn spawn() -> (ClientHandle, JoinHandle<()>) {
        let (handle, mailbox) = ClientHandle::channel();
        let client = Client::new(handle.clone());
        let task = tokio::spawn(client.run(mailbox));
        (handle, task)
    }

    pub async fn run(mut self, mut mailbox: mpsc::UnboundedReceiver<ClientEvent>) {
        tracing::debug!("Client {} started", self.handle.id());

        while let Some(event) = mailbox.recv().await {
            match event {
                ClientEvent::Command(command) => self.on_command(command),
                ClientEvent::Reply(reply) => self.on_reply(reply),
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    fn next_request_id(&mut self) -> RequestId {
        self.counter += 1;
        format!("{}/{}", self.handle.id(), self.counter)
    }

    fn origin(&self) -> Origin {
        Origin::Client(self.handle.clone())
    }

    fn on_command(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::Write {
                coordinator,
                key,
                value,
                respond_to,
            } => {
                if self.is_busy() {
                    let _ = respond_to.send(Err(ClientError::Busy));
                    return;
                }
                coordinator.send(self.origin(), Message::AskWrite { key, value });
                let _ = respond_to.send(Ok(()));
            }
            ClientCommand::Read {
                coordinator,
                key,
                respond_to,
            } => {
                if self.is_busy() {
                    let _ = respond_to.send(Err(ClientError::Busy));
                    return;
                }
                let request_id = self.next_request_id();
                tracing::debug!("Client sends read {} of key {}", request_id, key);
                coordinator.send(
                    self.origin(),
                    Message::AskRead {
                        key,
                        request_id: request_id.clone(),
                    },
                );
                self.outstanding = Some(Outstanding::Read {
                    request_id,
                    respond_to,
                });
            }
            ClientCommand::Update {
                coordinator,
                key,
                value,
                respond_to,
            } => {
                if self.is_busy() {
                    let _ = respond_to.send(Err(ClientError::Busy));
                    return;
                }
                let request_id = self.next_request_id();
                tracing::debug!("Client sends update {} of key {}", request_id, key);
                coordinator.send(
                    self.origin(),
                    Message::AskUpdate {
                        key,
                        value,
                        request_id: request_id.clone(),
                    },
                );
                self.outstanding = Some(Outstanding::Update {
                    request_id,
                    respond_to,
                });
            }
        }
    }

    fn on_reply(&mut self, reply: ClientReply) {
        let matches = self
            .outstanding
            .as_ref()
            .is_some_and(|outstanding| outstanding.request_id() == reply.request_id());
        if !matches {
            tracing::warn!("Client dropped reply for {}: not outstanding", reply.request_id());
            return;
        }
        let Some(outstanding) = self.outstanding.take() else {
            return;
        };

        match (outstanding, reply) {
            (Outstanding::Read { respond_to, .. }, ClientReply::ReadResult { request_id, value }) => {
                tracing::info!("Read {} returned \"{}\"", request_id, value);
                let _ = respond_to.send(Ok(value));
            }
            (Outstanding::Read { respond_to, .. }, ClientReply::ReadTimeout { request_id }) => {
                tracing::warn!("Read {} timed out", request_id);
                let _ = respond_to.send(Err(ClientError::ReadTimeout(request_id)));
            }
            (
                Outstanding::Update { respond_to, .. },
                ClientReply::UpdateResult {
                    request_id,
                    version,
                },
            ) => {
                tracing::info!("Update {} committed version {}", request_id, version);
                let _ = respond_to.send(Ok(version));
            }
            (Outstanding::Update { respond_to, .. }, ClientReply::UpdateTimeout { request_id }) => {
                tracing::warn!("Update {} timed out", request_id);
                let _ = respond_to.send(Err(ClientError::UpdateTimeout(request_id)));
            }
            (outstanding, reply) => {
                tracing::warn!(
                    "Client got {:?} for request {} of another kind",
                    reply,
                    outstanding.request_id()
                );
                self.outstanding = Some(outstanding);
            }
        }
    }
}
