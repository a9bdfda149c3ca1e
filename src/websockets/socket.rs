use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::game::ClientContext;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Handler for incoming WebSocket messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, client: &ClientContext, message: String);
}

#[derive(Debug)]
pub enum SocketError {
    ConnectionClosed,
    SendFailed(String),
    ReceiveFailed(String),
}

#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Pings are answered by axum; binary frames are not part of the protocol
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// A managed client socket. Outbound messages arrive on the receiver that was
/// registered with the ConnectionManager under `client.connection_id`.
pub struct Connection {
    pub client: ClientContext,
    socket: Box<dyn SocketWrapper>,
    outbound_receiver: mpsc::UnboundedReceiver<String>,
    message_handler: Arc<dyn MessageHandler>,
}

impl Connection {
    pub fn new(
        client: ClientContext,
        socket: Box<dyn SocketWrapper>,
        outbound_receiver: mpsc::UnboundedReceiver<String>,
        message_handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            client,
            socket,
            outbound_receiver,
            message_handler,
        }
    }

    /// Run the connection - handles both sending and receiving until disconnect
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                msg = self.outbound_receiver.recv() => {
                    match msg {
                        Some(message) => self.socket.send_message(message).await?,
                        None => break,
                    }
                }

                msg = self.socket.receive_message() => {
                    match msg {
                        Ok(Some(message)) => {
                            self.message_handler
                                .handle_message(&self.client, message)
                                .await;
                        }
                        Ok(None) => break,
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        let _ = self.socket.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    struct ScriptedSocket {
        inbound: VecDeque<String>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl SocketWrapper for ScriptedSocket {
        async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
            self.sent.lock().await.push(message);
            Ok(())
        }

        async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
            match self.inbound.pop_front() {
                Some(message) => Ok(Some(message)),
                // Keep the socket open so outbound traffic can drain
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> Result<(), SocketError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHandler {
        received: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessageHandler for RecordingHandler {
        async fn handle_message(&self, client: &ClientContext, message: String) {
            self.received
                .lock()
                .await
                .push((client.connection_id.clone(), message));
        }
    }

    fn client() -> ClientContext {
        ClientContext {
            connection_id: "conn-1".to_string(),
            identity: "id-alice".to_string(),
            username: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_run_relays_both_directions_until_channel_closes() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let socket = ScriptedSocket {
            inbound: VecDeque::from(vec!["hello".to_string()]),
            sent: Arc::clone(&sent),
        };
        let handler = Arc::new(RecordingHandler::default());
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send("outbound".to_string()).unwrap();
        let connection = Connection::new(client(), Box::new(socket), rx, handler.clone());
        let run = tokio::spawn(connection.run());

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        drop(tx);
        run.await.unwrap().unwrap();

        assert_eq!(*sent.lock().await, vec!["outbound".to_string()]);
        assert_eq!(
            *handler.received.lock().await,
            vec![("conn-1".to_string(), "hello".to_string())]
        );
    }
}
