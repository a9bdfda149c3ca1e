use std::sync::Arc;
use tracing::warn;

use super::{connection_manager::ConnectionManager, messages::WebSocketMessage};
use crate::room::models::{PlayerId, RoomModel};

/// Serializes messages and fans them out to a room's current connections
#[derive(Clone)]
pub struct MessageBroadcaster {
    connection_manager: Arc<dyn ConnectionManager>,
}

impl MessageBroadcaster {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    fn encode(message: &WebSocketMessage) -> Option<String> {
        match serde_json::to_string(message) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(error = %e, message_type = ?message.message_type, "Failed to serialize message");
                None
            }
        }
    }

    pub async fn to_connection(&self, connection_id: &str, message: &WebSocketMessage) {
        if let Some(json) = Self::encode(message) {
            self.connection_manager
                .send_to_connection(connection_id, &json)
                .await;
        }
    }

    pub async fn to_room(&self, room: &RoomModel, message: &WebSocketMessage) {
        let recipients: Vec<String> = room
            .players
            .iter()
            .map(|p| p.connection_id.clone())
            .collect();
        self.to_connections(&recipients, message).await;
    }

    /// Everyone in the room except `excluded`
    pub async fn to_room_except(
        &self,
        room: &RoomModel,
        excluded: PlayerId,
        message: &WebSocketMessage,
    ) {
        let recipients: Vec<String> = room
            .players
            .iter()
            .filter(|p| p.id != excluded)
            .map(|p| p.connection_id.clone())
            .collect();
        self.to_connections(&recipients, message).await;
    }

    async fn to_connections(&self, recipients: &[String], message: &WebSocketMessage) {
        if recipients.is_empty() {
            return;
        }
        if let Some(json) = Self::encode(message) {
            self.connection_manager
                .send_to_connections(recipients, &json)
                .await;
        }
    }
}
