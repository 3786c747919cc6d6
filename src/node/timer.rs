use super::protocol::{Message, Origin};
use crate::membership::types::NodeHandle;

use std::time::Duration;
use tokio::task::JoinHandle;

/// Posts `message` back into `target`'s own mailbox after `delay`.
///
/// Timers are never cancelled; the handler of the delivered message decides
/// whether it still matters.
pub fn schedule(target: &NodeHandle, delay: Duration, message: Message) -> JoinHandle<()> {
    let target = target.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        tracing::trace!("Timer fired: {} for node {}", message.kind(), target.id());
        target.send(Origin::Timer, message);
    })
}
