use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::shared::AppError;

pub type RoomId = i64;
pub type PlayerId = i64;

const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ROOM_CODE_LENGTH: usize = 6;

/// Room lifecycle. `Finished` is terminal except through a host restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum RoomType {
    Public,
    Private,
}

/// Sub-cycle of a single turn while the room is `Playing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// No turn in progress (room waiting or finished)
    Idle,
    AwaitingWord,
    RoundActive,
    RoundResolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub min_players: usize,
    pub max_players: usize,
    pub total_rounds: u32,
    pub round_duration_seconds: u32,
    pub hint_letters_count: u32,
    pub custom_hints_enabled: bool,
}

impl RoomSettings {
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 3;
    pub const MIN_ROUNDS: u32 = 2;
    pub const MAX_ROUNDS: u32 = 5;
    pub const MIN_DURATION_SECONDS: u32 = 20;
    pub const MAX_DURATION_SECONDS: u32 = 180;
    pub const MIN_HINT_LETTERS: u32 = 1;
    pub const MAX_HINT_LETTERS: u32 = 5;

    /// Settings every matchmade room is created with
    pub fn public_defaults() -> Self {
        Self {
            min_players: Self::MIN_PLAYERS,
            max_players: Self::MAX_PLAYERS,
            total_rounds: 3,
            round_duration_seconds: 120,
            hint_letters_count: 1,
            custom_hints_enabled: false,
        }
    }

    pub fn private(
        max_players: usize,
        total_rounds: u32,
        round_duration_seconds: u32,
        hint_letters_count: u32,
        custom_hints_enabled: bool,
    ) -> Self {
        Self {
            min_players: Self::MIN_PLAYERS,
            max_players,
            total_rounds,
            round_duration_seconds,
            hint_letters_count,
            custom_hints_enabled,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_players < Self::MIN_PLAYERS || self.max_players > Self::MAX_PLAYERS {
            return Err(AppError::BadRequest(format!(
                "Max players must be between {} and {}",
                Self::MIN_PLAYERS,
                Self::MAX_PLAYERS
            )));
        }
        if self.min_players < Self::MIN_PLAYERS || self.min_players > self.max_players {
            return Err(AppError::BadRequest(format!(
                "Min players must be between {} and max players",
                Self::MIN_PLAYERS
            )));
        }
        if self.total_rounds < Self::MIN_ROUNDS || self.total_rounds > Self::MAX_ROUNDS {
            return Err(AppError::BadRequest(format!(
                "Total rounds must be between {} and {}",
                Self::MIN_ROUNDS,
                Self::MAX_ROUNDS
            )));
        }
        if self.round_duration_seconds < Self::MIN_DURATION_SECONDS
            || self.round_duration_seconds > Self::MAX_DURATION_SECONDS
        {
            return Err(AppError::BadRequest(format!(
                "Round duration must be between {} and {} seconds",
                Self::MIN_DURATION_SECONDS,
                Self::MAX_DURATION_SECONDS
            )));
        }
        if self.hint_letters_count < Self::MIN_HINT_LETTERS
            || self.hint_letters_count > Self::MAX_HINT_LETTERS
        {
            return Err(AppError::BadRequest(format!(
                "Hint letters must be between {} and {}",
                Self::MIN_HINT_LETTERS,
                Self::MAX_HINT_LETTERS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerModel {
    pub id: PlayerId,
    /// Stable external identity (mobile number), survives reconnects
    pub identity: String,
    pub username: String,
    /// Handle of the socket currently bound to this player
    pub connection_id: String,
    pub score: i32,
    pub is_drawing: bool,
    pub has_guessed_correctly: bool,
    pub guess_time: Option<DateTime<Utc>>,
    pub is_host: bool,
    pub joined_at: DateTime<Utc>,
}

/// Outcome of moving a room to its next turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAdvance {
    Continued,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomModel {
    pub id: RoomId,
    pub code: String,
    pub status: RoomStatus,
    pub room_type: RoomType,
    pub settings: RoomSettings,
    /// 0 until the first game starts
    pub current_round: u32,
    pub current_drawer_index: usize,
    pub current_word: Option<String>,
    pub current_hint: Option<String>,
    pub word_options: Option<Vec<String>>,
    pub round_started_at: Option<DateTime<Utc>>,
    pub phase: TurnPhase,
    /// Bumped on every turn change; timers carry it to detect stale callbacks
    pub turn_seq: u64,
    pub game_number: u32,
    pub created_at: DateTime<Utc>,
    /// Join order defines turn order
    pub players: Vec<PlayerModel>,
}

impl RoomModel {
    /// Creates a new waiting room. The id is assigned by the repository.
    pub fn new(code: String, room_type: RoomType, settings: RoomSettings) -> Self {
        Self {
            id: 0,
            code,
            status: RoomStatus::Waiting,
            room_type,
            settings,
            current_round: 0,
            current_drawer_index: 0,
            current_word: None,
            current_hint: None,
            word_options: None,
            round_started_at: None,
            phase: TurnPhase::Idle,
            turn_seq: 0,
            game_number: 0,
            created_at: Utc::now(),
            players: Vec::new(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.settings.max_players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerModel> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut PlayerModel> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn player_by_identity(&self, identity: &str) -> Option<&PlayerModel> {
        self.players.iter().find(|p| p.identity == identity)
    }

    pub fn can_start(&self) -> bool {
        self.status == RoomStatus::Waiting && self.players.len() >= self.settings.min_players
    }

    /// The player whose turn it is, whether or not a word has been chosen yet
    pub fn drawer(&self) -> Option<&PlayerModel> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        self.players.get(self.current_drawer_index)
    }

    pub fn is_drawer(&self, player_id: PlayerId) -> bool {
        self.drawer().is_some_and(|d| d.id == player_id)
    }

    /// True when every non-drawing player has guessed and there is at least one of them
    pub fn non_drawers_all_guessed(&self) -> bool {
        let mut guessers = self
            .players
            .iter()
            .filter(|p| !self.is_drawer(p.id))
            .peekable();
        guessers.peek().is_some() && guessers.all(|p| p.has_guessed_correctly)
    }

    fn clear_turn_state(&mut self) {
        for player in &mut self.players {
            player.is_drawing = false;
            player.has_guessed_correctly = false;
            player.guess_time = None;
        }
        self.current_word = None;
        self.current_hint = None;
        self.word_options = None;
        self.round_started_at = None;
    }

    pub fn start_game(&mut self, word_options: Vec<String>) {
        self.clear_turn_state();
        self.status = RoomStatus::Playing;
        self.current_round = 1;
        self.current_drawer_index = 0;
        self.word_options = Some(word_options);
        self.phase = TurnPhase::AwaitingWord;
        self.turn_seq += 1;
        self.game_number += 1;
    }

    /// Locks in the drawer's word and opens the guessing window
    pub fn begin_round(&mut self, word: String, hint: String, now: DateTime<Utc>) {
        let drawer_index = self.current_drawer_index;
        for (index, player) in self.players.iter_mut().enumerate() {
            player.is_drawing = index == drawer_index;
        }
        self.current_word = Some(word);
        self.current_hint = Some(hint);
        self.word_options = None;
        self.round_started_at = Some(now);
        self.phase = TurnPhase::RoundActive;
    }

    /// Marks a correct guess, crediting the guesser and the drawer
    pub fn award_correct_guess(
        &mut self,
        player_id: PlayerId,
        points: i32,
        drawer_bonus: i32,
        now: DateTime<Utc>,
    ) {
        let drawer_id = self.drawer().map(|d| d.id);
        if let Some(player) = self.player_mut(player_id) {
            player.has_guessed_correctly = true;
            player.guess_time = Some(now);
            player.score += points;
        }
        if let Some(drawer) = drawer_id.and_then(|id| self.player_mut(id)) {
            drawer.score += drawer_bonus;
        }
    }

    pub fn resolve_round(&mut self) {
        self.phase = TurnPhase::RoundResolved;
    }

    /// Moves to the next drawer. With `keep_index` the current index is reused,
    /// which is what happens after the drawer's own slot was vacated.
    pub fn advance_turn(&mut self, word_options: Vec<String>, keep_index: bool) -> TurnAdvance {
        self.clear_turn_state();
        self.turn_seq += 1;

        if self.players.is_empty() {
            self.finish();
            return TurnAdvance::Finished;
        }

        let mut next = if keep_index {
            self.current_drawer_index
        } else {
            self.current_drawer_index + 1
        };
        if next >= self.players.len() {
            next = 0;
            self.current_round += 1;
        }

        if self.current_round > self.settings.total_rounds {
            self.finish();
            return TurnAdvance::Finished;
        }

        self.current_drawer_index = next;
        self.word_options = Some(word_options);
        self.phase = TurnPhase::AwaitingWord;
        TurnAdvance::Continued
    }

    fn finish(&mut self) {
        self.status = RoomStatus::Finished;
        self.phase = TurnPhase::Idle;
    }

    /// Restores the room to the lobby, keeping its players
    pub fn reset_to_waiting(&mut self) {
        self.clear_turn_state();
        for player in &mut self.players {
            player.score = 0;
        }
        self.status = RoomStatus::Waiting;
        self.phase = TurnPhase::Idle;
        self.current_round = 0;
        self.current_drawer_index = 0;
        self.turn_seq += 1;
    }

    /// Removes a player, keeping the drawer index pointing at the same turn slot.
    /// Returns the removed player and whether they were the active drawer.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<(PlayerModel, bool)> {
        let index = self.players.iter().position(|p| p.id == player_id)?;
        let was_drawer = self.status == RoomStatus::Playing && index == self.current_drawer_index;

        let removed = self.players.remove(index);

        if self.status == RoomStatus::Playing && index < self.current_drawer_index {
            self.current_drawer_index -= 1;
        }
        if self.players.is_empty() {
            self.finish();
        }

        Some((removed, was_drawer))
    }
}

/// Generates a random 6 character room code from `[A-Z0-9]`
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())] as char)
        .collect()
}

/// Upper-cases a user supplied code and checks its shape
pub fn normalize_room_code(code: &str) -> Result<String, AppError> {
    let code = code.trim().to_uppercase();
    if code.len() != ROOM_CODE_LENGTH || !code.bytes().all(|b| ROOM_CODE_CHARSET.contains(&b)) {
        return Err(AppError::BadRequest("Invalid room code".to_string()));
    }
    Ok(code)
}
