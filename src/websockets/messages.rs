use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::room::models::{PlayerId, RoomId};
use crate::room::types::{PlayerScore, RoomResponse};

/// Message types for WebSocket communication
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    JoinPublicQueue,
    LeaveRoom,
    CreatePrivateRoom,
    JoinPrivateRoom,
    StartGame,
    KickPlayer,
    RestartGame,
    SubmitGuess,
    CheckRoom,

    // Both directions
    SelectWord,
    Draw,
    ClearCanvas,

    // Server -> Client
    RoomUpdated,
    PlayerJoined,
    RejoinedRoom,
    GameStarted,
    DrawingStarted,
    ChatMessage,
    ScoresUpdated,
    TimeUp,
    NewTurn,
    GameEnded,
    PlayerLeft,
    PlayerKicked,
    KickedFromRoom,
    LeftRoom,
    GameRestarted,
    Result,
    Error,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinPublicQueuePayload {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPrivateRoomPayload {
    pub room_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KickPlayerPayload {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectWordPayload {
    pub word: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitGuessPayload {
    pub text: String,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoinedPayload {
    pub player_id: PlayerId,
    pub username: String,
    pub room: RoomResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejoinedRoomPayload {
    pub player_id: PlayerId,
    pub username: String,
    pub room: RoomResponse,
}

/// Shared by GAME_STARTED and NEW_TURN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnPayload {
    pub round: u32,
    pub total_rounds: u32,
    pub drawer_id: PlayerId,
    pub drawer_name: String,
    pub players: Vec<PlayerScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordOptionsPayload {
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingStartedPayload {
    pub hint: String,
    pub word_length: usize,
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub username: String,
    pub text: String,
    pub is_correct: bool,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayersPayload {
    pub players: Vec<PlayerScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeUpPayload {
    pub correct_word: Option<String>,
    pub players: Vec<PlayerScore>,
    pub all_guessed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLeftPayload {
    pub username: String,
    pub players: Vec<PlayerScore>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerKickedPayload {
    pub kicked_player_id: PlayerId,
    pub kicked_username: String,
    pub players: Vec<PlayerScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRestartedPayload {
    pub room_id: RoomId,
    pub room_code: String,
    pub players: Vec<PlayerScore>,
}

/// Reply to a request/response style client message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPayload {
    pub action: MessageType,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

fn to_payload<T: Serialize>(payload: T) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    /// Parses the payload into a typed struct
    pub fn parse_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let payload = if self.payload.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            self.payload.clone()
        };
        serde_json::from_value(payload)
    }

    pub fn room_updated(room: RoomResponse) -> Self {
        Self::new(MessageType::RoomUpdated, to_payload(room))
    }

    pub fn player_joined(player_id: PlayerId, username: String, room: RoomResponse) -> Self {
        let payload = PlayerJoinedPayload {
            player_id,
            username,
            room,
        };
        Self::new(MessageType::PlayerJoined, to_payload(payload))
    }

    pub fn rejoined_room(player_id: PlayerId, username: String, room: RoomResponse) -> Self {
        let payload = RejoinedRoomPayload {
            player_id,
            username,
            room,
        };
        Self::new(MessageType::RejoinedRoom, to_payload(payload))
    }

    pub fn game_started(turn: TurnPayload) -> Self {
        Self::new(MessageType::GameStarted, to_payload(turn))
    }

    pub fn new_turn(turn: TurnPayload) -> Self {
        Self::new(MessageType::NewTurn, to_payload(turn))
    }

    /// Word options, sent to the drawer only
    pub fn select_word(options: Vec<String>) -> Self {
        Self::new(
            MessageType::SelectWord,
            to_payload(WordOptionsPayload { options }),
        )
    }

    pub fn drawing_started(hint: String, word_length: usize, duration_seconds: u32) -> Self {
        let payload = DrawingStartedPayload {
            hint,
            word_length,
            duration_seconds,
        };
        Self::new(MessageType::DrawingStarted, to_payload(payload))
    }

    pub fn chat(username: String, text: String, is_correct: bool) -> Self {
        let payload = ChatMessagePayload {
            username,
            text,
            is_correct,
            is_system: false,
        };
        Self::new(MessageType::ChatMessage, to_payload(payload))
    }

    pub fn system_chat(text: impl Into<String>) -> Self {
        let payload = ChatMessagePayload {
            username: "System".to_string(),
            text: text.into(),
            is_correct: false,
            is_system: true,
        };
        Self::new(MessageType::ChatMessage, to_payload(payload))
    }

    pub fn scores_updated(players: Vec<PlayerScore>) -> Self {
        Self::new(
            MessageType::ScoresUpdated,
            to_payload(PlayersPayload { players }),
        )
    }

    pub fn time_up(correct_word: Option<String>, players: Vec<PlayerScore>, all_guessed: bool) -> Self {
        let payload = TimeUpPayload {
            correct_word,
            players,
            all_guessed,
        };
        Self::new(MessageType::TimeUp, to_payload(payload))
    }

    pub fn game_ended(players: Vec<PlayerScore>) -> Self {
        Self::new(MessageType::GameEnded, to_payload(PlayersPayload { players }))
    }

    pub fn player_left(username: String, players: Vec<PlayerScore>) -> Self {
        let payload = PlayerLeftPayload {
            username,
            count: players.len(),
            players,
        };
        Self::new(MessageType::PlayerLeft, to_payload(payload))
    }

    pub fn player_kicked(
        kicked_player_id: PlayerId,
        kicked_username: String,
        players: Vec<PlayerScore>,
    ) -> Self {
        let payload = PlayerKickedPayload {
            kicked_player_id,
            kicked_username,
            players,
        };
        Self::new(MessageType::PlayerKicked, to_payload(payload))
    }

    pub fn kicked_from_room() -> Self {
        let payload = MessagePayload {
            message: "You have been removed from the room by the host".to_string(),
        };
        Self::new(MessageType::KickedFromRoom, to_payload(payload))
    }

    pub fn left_room() -> Self {
        Self::new(MessageType::LeftRoom, serde_json::json!({ "success": true }))
    }

    pub fn game_restarted(room_id: RoomId, room_code: String, players: Vec<PlayerScore>) -> Self {
        let payload = GameRestartedPayload {
            room_id,
            room_code,
            players,
        };
        Self::new(MessageType::GameRestarted, to_payload(payload))
    }

    /// Relays an opaque stroke payload verbatim
    pub fn draw(payload: serde_json::Value) -> Self {
        Self::new(MessageType::Draw, payload)
    }

    pub fn clear_canvas() -> Self {
        Self::new(MessageType::ClearCanvas, serde_json::json!({}))
    }

    pub fn success(action: MessageType, data: Option<serde_json::Value>) -> Self {
        let payload = ResultPayload {
            action,
            success: true,
            error: None,
            data,
        };
        Self::new(MessageType::Result, to_payload(payload))
    }

    pub fn failure(action: MessageType, error: String) -> Self {
        let payload = ResultPayload {
            action,
            success: false,
            error: Some(error),
            data: None,
        };
        Self::new(MessageType::Result, to_payload(payload))
    }

    pub fn error(message: String) -> Self {
        Self::new(MessageType::Error, to_payload(MessagePayload { message }))
    }
}
