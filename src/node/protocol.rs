//! Message Catalogue
//!
//! Every message a data node can receive, grouped by the protocol path it belongs to.
//! Messages travel inside an [`Envelope`] whose [`Origin`] tells the receiver where a
//! reply has to go.

use super::types::NodeSnapshot;
use crate::client::types::ClientHandle;
use crate::membership::types::{NodeHandle, Position, RingEntry};
use crate::quorum::types::RequestId;
use crate::storage::types::{DataItem, Key, LockToken, Version};

use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::oneshot;

/// Who posted a message into a node's mailbox.
#[derive(Debug, Clone)]
pub enum Origin {
    Node(NodeHandle),
    Client(ClientHandle),
    /// External command (bootstrap, test harness, CLI).
    Operator,
    /// Delayed message the node scheduled for itself.
    Timer,
}

#[derive(Debug)]
pub struct Envelope {
    pub origin: Origin,
    pub message: Message,
}

#[derive(Debug)]
pub enum Message {
    // --- setup / plain write ---
    InitializeGroup { entries: Vec<RingEntry> },
    AskWrite { key: Key, value: String },
    Write { key: Key, value: String },

    // --- read ---
    AskRead { key: Key, request_id: RequestId },
    ReadProbe { key: Key, request_id: RequestId },
    ReadReply { key: Key, item: DataItem, request_id: RequestId },
    ReadExpired { request_id: RequestId },

    // --- update ---
    AskUpdate { key: Key, value: String, request_id: RequestId },
    VersionProbe { key: Key, request_id: RequestId },
    VersionReply { key: Key, version: Version, request_id: RequestId },
    UpdateCommit { key: Key, value: String, version: Version },
    UpdateExpired { request_id: RequestId },
    LockExpired { key: Key, token: LockToken },

    // --- join ---
    AskToJoin { bootstrap: NodeHandle },
    AskGroup,
    GroupReply { entries: Vec<RingEntry> },
    AskKeys,
    KeysReply { keys: BTreeSet<Key> },
    AskItemData { key: Key },
    ItemDataReply { key: Key, item: Option<DataItem> },
    AnnounceJoin { position: Position },

    // --- leave ---
    AskToLeave,
    AnnounceLeave,
    NewData { key: Key, item: DataItem },

    // --- crash / recovery ---
    AskCrash,
    AskRecover { helper: NodeHandle },
    AskGroupToRecover,
    GroupToRecoverReply { entries: Vec<RingEntry> },
    AskDataToRecover { position: Position },
    DataToRecoverReply { items: BTreeMap<Key, DataItem> },
    RecoveryTimeout,

    // --- status ---
    AskStatus,
    PrintStatus,
    Inspect { respond_to: oneshot::Sender<NodeSnapshot> },
}

impl Message {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::InitializeGroup { .. } => "InitializeGroup",
            Message::AskWrite { .. } => "AskWrite",
            Message::Write { .. } => "Write",
            Message::AskRead { .. } => "AskRead",
            Message::ReadProbe { .. } => "ReadProbe",
            Message::ReadReply { .. } => "ReadReply",
            Message::ReadExpired { .. } => "ReadExpired",
            Message::AskUpdate { .. } => "AskUpdate",
            Message::VersionProbe { .. } => "VersionProbe",
            Message::VersionReply { .. } => "VersionReply",
            Message::UpdateCommit { .. } => "UpdateCommit",
            Message::UpdateExpired { .. } => "UpdateExpired",
            Message::LockExpired { .. } => "LockExpired",
            Message::AskToJoin { .. } => "AskToJoin",
            Message::AskGroup => "AskGroup",
            Message::GroupReply { .. } => "GroupReply",
            Message::AskKeys => "AskKeys",
            Message::KeysReply { .. } => "KeysReply",
            Message::AskItemData { .. } => "AskItemData",
            Message::ItemDataReply { .. } => "ItemDataReply",
            Message::AnnounceJoin { .. } => "AnnounceJoin",
            Message::AskToLeave => "AskToLeave",
            Message::AnnounceLeave => "AnnounceLeave",
            Message::NewData { .. } => "NewData",
            Message::AskCrash => "AskCrash",
            Message::AskRecover { .. } => "AskRecover",
            Message::AskGroupToRecover => "AskGroupToRecover",
            Message::GroupToRecoverReply { .. } => "GroupToRecoverReply",
            Message::AskDataToRecover { .. } => "AskDataToRecover",
            Message::DataToRecoverReply { .. } => "DataToRecoverReply",
            Message::RecoveryTimeout => "RecoveryTimeout",
            Message::AskStatus => "AskStatus",
            Message::PrintStatus => "PrintStatus",
            Message::Inspect { .. } => "Inspect",
        }
    }
}
