//! Client Module Tests
//!
//! A bare channel handle plays the coordinator so each request the client emits
//! can be answered by hand.

#[cfg(test)]
mod tests {
    use crate::client::actor::Client;
    use crate::client::types::{ClientHandle, ClientId, ClientReply};
    use crate::error::ClientError;
    use crate::membership::types::NodeHandle;
    use crate::node::protocol::{Envelope, Message, Origin};

    use tokio::sync::mpsc;

    async fn next_request(inbox: &mut mpsc::UnboundedReceiver<Envelope>) -> (ClientHandle, Message) {
        let envelope = inbox.recv().await.expect("coordinator mailbox closed");
        match envelope.origin {
            Origin::Client(client) => (client, envelope.message),
            other => panic!("Expected a client origin, got {:?}", other),
        }
    }

    fn request_id_of(message: &Message) -> String {
        match message {
            Message::AskRead { request_id, .. } | Message::AskUpdate { request_id, .. } => {
                request_id.clone()
            }
            other => panic!("Not a quorum request: {:?}", other),
        }
    }

    #[test]
    fn test_client_ids_are_unique() {
        assert_ne!(ClientId::new(), ClientId::new());
    }

    #[tokio::test]
    async fn test_read_resolves_with_coordinator_answer() {
        let (client, _task) = Client::spawn();
        let (coordinator, mut inbox) = NodeHandle::channel();

        let pending = client.read(&coordinator, 25);
        let (origin, message) = next_request(&mut inbox).await;
        assert_eq!(&origin, &client);
        let request_id = request_id_of(&message);
        assert!(request_id.starts_with(&client.id().0));

        client.deliver(ClientReply::ReadResult {
            request_id,
            value: "X".to_string(),
        });

        assert_eq!(pending.wait().await, Ok("X".to_string()));
    }

    #[tokio::test]
    async fn test_second_request_while_busy_is_rejected() {
        let (client, _task) = Client::spawn();
        let (coordinator, mut inbox) = NodeHandle::channel();

        let first = client.update(&coordinator, 25, "Y");
        let second = client.read(&coordinator, 25);
        let write = client.write(&coordinator, 30, "Z");

        assert_eq!(second.wait().await, Err(ClientError::Busy));
        assert_eq!(write.wait().await, Err(ClientError::Busy));

        let (_, message) = next_request(&mut inbox).await;
        let request_id = request_id_of(&message);
        client.deliver(ClientReply::UpdateResult {
            request_id,
            version: 2,
        });
        assert_eq!(first.wait().await, Ok(2));
        assert!(inbox.try_recv().is_err(), "Rejected calls never reach the coordinator");
    }

    #[tokio::test]
    async fn test_timeout_reply_maps_to_error_and_frees_client() {
        let (client, _task) = Client::spawn();
        let (coordinator, mut inbox) = NodeHandle::channel();

        let pending = client.read(&coordinator, 7);
        let (_, message) = next_request(&mut inbox).await;
        let request_id = request_id_of(&message);
        client.deliver(ClientReply::ReadTimeout {
            request_id: request_id.clone(),
        });
        assert_eq!(pending.wait().await, Err(ClientError::ReadTimeout(request_id)));

        let write = client.write(&coordinator, 7, "seven");
        assert_eq!(write.wait().await, Ok(()));
        let (_, message) = next_request(&mut inbox).await;
        assert!(matches!(message, Message::AskWrite { key: 7, .. }));
    }

    #[tokio::test]
    async fn test_reply_for_other_request_is_dropped() {
        let (client, _task) = Client::spawn();
        let (coordinator, mut inbox) = NodeHandle::channel();

        let pending = client.update(&coordinator, 1, "one");
        let (_, message) = next_request(&mut inbox).await;
        let request_id = request_id_of(&message);

        client.deliver(ClientReply::UpdateResult {
            request_id: "someone-else/1".to_string(),
            version: 9,
        });
        client.deliver(ClientReply::UpdateTimeout { request_id });

        assert!(matches!(pending.wait().await, Err(ClientError::UpdateTimeout(_))));
    }

    #[tokio::test]
    async fn test_pending_call_reports_disconnect() {
        let (client, task) = Client::spawn();
        let (coordinator, _inbox) = NodeHandle::channel();

        let pending = client.read(&coordinator, 3);
        tokio::task::yield_now().await;
        task.abort();

        assert_eq!(pending.wait().await, Err(ClientError::Disconnected));
    }
}
