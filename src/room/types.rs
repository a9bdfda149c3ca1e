use serde::{Deserialize, Serialize};

use super::models::{PlayerId, PlayerModel, RoomId, RoomModel, RoomSettings, RoomStatus, RoomType};

/// Public view of a player's standing in a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub username: String,
    pub score: i32,
    pub is_drawing: bool,
    pub has_guessed_correctly: bool,
    pub is_host: bool,
}

impl From<&PlayerModel> for PlayerScore {
    fn from(player: &PlayerModel) -> Self {
        Self {
            player_id: player.id,
            username: player.username.clone(),
            score: player.score,
            is_drawing: player.is_drawing,
            has_guessed_correctly: player.has_guessed_correctly,
            is_host: player.is_host,
        }
    }
}

/// Scoreboard in join order
pub fn scores_of(room: &RoomModel) -> Vec<PlayerScore> {
    room.players.iter().map(PlayerScore::from).collect()
}

/// Room snapshot sent to clients and returned by the REST endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: RoomId,
    pub code: String,
    pub status: RoomStatus,
    pub room_type: RoomType,
    pub settings: RoomSettings,
    pub current_round: u32,
    pub players: Vec<PlayerScore>,
}

impl From<&RoomModel> for RoomResponse {
    fn from(room: &RoomModel) -> Self {
        Self {
            id: room.id,
            code: room.code.clone(),
            status: room.status,
            room_type: room.room_type,
            settings: room.settings.clone(),
            current_round: room.current_round,
            players: scores_of(room),
        }
    }
}

fn default_max_players() -> usize {
    3
}

fn default_total_rounds() -> u32 {
    3
}

fn default_round_duration() -> u32 {
    120
}

fn default_hint_letters() -> u32 {
    1
}

/// Request payload for creating a private room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    #[serde(default = "default_total_rounds")]
    pub total_rounds: u32,
    #[serde(default = "default_round_duration")]
    pub round_duration_seconds: u32,
    #[serde(default = "default_hint_letters")]
    pub hint_letters_count: u32,
    #[serde(default)]
    pub custom_hints_enabled: bool,
}

impl Default for CreateRoomRequest {
    fn default() -> Self {
        Self {
            max_players: default_max_players(),
            total_rounds: default_total_rounds(),
            round_duration_seconds: default_round_duration(),
            hint_letters_count: default_hint_letters(),
            custom_hints_enabled: false,
        }
    }
}

impl CreateRoomRequest {
    pub fn settings(&self) -> RoomSettings {
        RoomSettings::private(
            self.max_players,
            self.total_rounds,
            self.round_duration_seconds,
            self.hint_letters_count,
            self.custom_hints_enabled,
        )
    }
}

/// Response after a successful join or room creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub room_id: RoomId,
    pub room_code: String,
    pub player_id: PlayerId,
    pub is_host: bool,
}

/// Answer to "am I in a room?"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStatusResponse {
    pub in_room: bool,
    pub room_id: Option<RoomId>,
    pub room_code: Option<String>,
    pub username: Option<String>,
    pub status: Option<RoomStatus>,
}

impl RoomStatusResponse {
    pub fn not_in_room() -> Self {
        Self {
            in_room: false,
            room_id: None,
            room_code: None,
            username: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRoomResponse {
    pub success: bool,
}
