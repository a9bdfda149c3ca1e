#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::json;
use tokio::time::{sleep, Duration};

use scribble::{
    game::ClientContext,
    room::models::{PlayerId, RoomModel},
    websockets::{MessageHandler, MessageType, WebSocketMessage},
};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a WebSocket message as `client`
    pub async fn send_message_as(&self, client: &ClientContext, message: WebSocketMessage) {
        let message_json = serde_json::to_string(&message).unwrap();
        self.input_handler.handle_message(client, message_json).await;
    }

    /// Send a WebSocket message from a player's default connection
    pub async fn send_message(&self, player: &str, message: WebSocketMessage) {
        self.send_message_as(&self.client(player), message).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    /// Let paused time run forward so armed timers can fire
    pub async fn advance(&self, duration: Duration) {
        sleep(duration).await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn send_join_public_queue(&self, player: &str) {
        self.send_message(
            player,
            WebSocketMessage::new(MessageType::JoinPublicQueue, json!({})),
        )
        .await;
    }

    pub async fn send_create_private_room(&self, player: &str, settings: serde_json::Value) {
        self.send_message(
            player,
            WebSocketMessage::new(MessageType::CreatePrivateRoom, settings),
        )
        .await;
    }

    pub async fn send_join_private_room(&self, player: &str, room_code: &str) {
        self.send_message(
            player,
            WebSocketMessage::new(MessageType::JoinPrivateRoom, json!({ "room_code": room_code })),
        )
        .await;
    }

    pub async fn send_start_game(&self, player: &str) {
        self.send_message(
            player,
            WebSocketMessage::new(MessageType::StartGame, json!({})),
        )
        .await;
    }

    pub async fn send_select_word(&self, player: &str, word: &str) {
        self.send_message(
            player,
            WebSocketMessage::new(MessageType::SelectWord, json!({ "word": word })),
        )
        .await;
    }

    pub async fn send_guess(&self, player: &str, text: &str) {
        self.send_message(
            player,
            WebSocketMessage::new(MessageType::SubmitGuess, json!({ "text": text })),
        )
        .await;
    }

    pub async fn send_leave(&self, player: &str) {
        self.send_message(
            player,
            WebSocketMessage::new(MessageType::LeaveRoom, json!({})),
        )
        .await;
    }

    pub async fn send_kick(&self, host: &str, target: &str) {
        let player_id = self.player_id(target).await;
        self.send_message(
            host,
            WebSocketMessage::new(MessageType::KickPlayer, json!({ "player_id": player_id })),
        )
        .await;
    }

    pub async fn send_restart(&self, host: &str) {
        self.send_message(
            host,
            WebSocketMessage::new(MessageType::RestartGame, json!({})),
        )
        .await;
    }

    pub async fn send_draw(&self, player: &str, stroke: serde_json::Value) {
        self.send_message(player, WebSocketMessage::new(MessageType::Draw, stroke))
            .await;
    }

    /// First player creates a private room with `settings`, the rest join it.
    /// Returns the room code with all message queues cleared.
    pub async fn seat_players_in_private_room(&self, settings: serde_json::Value) -> String {
        let (host, guests) = self
            .players
            .split_first()
            .expect("setup needs at least one player");

        self.send_create_private_room(host, settings).await;
        let code = self.room_code_of(host).await;
        for guest in guests {
            self.send_join_private_room(guest, &code).await;
        }

        self.clear_messages().await;
        code
    }

    /// Seats everyone in a private room with the shortest legal game and starts it
    pub async fn start_private_game(&self) -> RoomModel {
        self.seat_players_in_private_room(json!({ "total_rounds": 2, "round_duration_seconds": 60 }))
            .await;
        let host = self.players[0].clone();
        self.send_start_game(&host).await;
        self.room_of(&host).await
    }

    // ============================================================================
    // Lookups
    // ============================================================================

    pub async fn room_code_of(&self, player: &str) -> String {
        self.orchestrator
            .check_player_room(&Self::identity_of(player))
            .await
            .unwrap()
            .room_code
            .unwrap_or_else(|| panic!("{} is not in a room", player))
    }

    pub async fn room_of(&self, player: &str) -> RoomModel {
        let (room_id, _) = self
            .rooms
            .find_player_by_identity(&Self::identity_of(player))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("{} is not in a room", player));
        self.rooms.require_room(room_id).await.unwrap()
    }

    pub async fn player_id(&self, player: &str) -> PlayerId {
        self.rooms
            .find_player_by_identity(&Self::identity_of(player))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("{} is not in a room", player))
            .1
            .id
    }

    /// Username of whoever's turn it is in `player`'s room
    pub async fn drawer_in_room_of(&self, player: &str) -> String {
        self.room_of(player)
            .await
            .drawer()
            .map(|d| d.username.clone())
            .expect("room has no drawer")
    }
}
