use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::room::models::{PlayerId, RoomModel, TurnPhase};

const GUESSER_BASE_POINTS: i32 = 100;
const GUESSER_POINTS_PER_SECOND: f64 = 2.0;
const DRAWER_POINTS_PER_SECOND: f64 = 3.0;
const HINT_PLACEHOLDER: char = '_';

/// Outcome of evaluating a guess
#[derive(Debug, Clone, PartialEq)]
pub struct GuessResult {
    pub is_correct: bool,
    pub points: i32,
    pub elapsed_seconds: f64,
}

/// Why a guess could not be scored at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuessRejection {
    #[error("No word is active")]
    NoActiveWord,
    #[error("Player is not in the room")]
    PlayerNotFound,
    #[error("The drawer cannot guess")]
    IsDrawer,
    #[error("Player already guessed correctly")]
    AlreadyGuessed,
    #[error("Round time is over")]
    TooLate,
}

/// Points for a correct guess `elapsed_seconds` into a round of `duration_seconds`
pub fn guesser_points(duration_seconds: u32, elapsed_seconds: f64) -> i32 {
    let remaining = duration_seconds as f64 - elapsed_seconds;
    GUESSER_BASE_POINTS + ((GUESSER_POINTS_PER_SECOND * remaining).round() as i32).max(0)
}

/// Bonus the drawer earns for each correct guess
pub fn drawer_points(duration_seconds: u32, elapsed_seconds: f64) -> i32 {
    let remaining = duration_seconds as f64 - elapsed_seconds;
    ((DRAWER_POINTS_PER_SECOND * remaining).round() as i32).max(0)
}

/// Evaluates `text` from `player_id` against the room's active word at `now`.
/// An incorrect guess is `Ok` with `is_correct == false`.
pub fn evaluate_guess(
    room: &RoomModel,
    player_id: PlayerId,
    text: &str,
    now: DateTime<Utc>,
) -> Result<GuessResult, GuessRejection> {
    let (word, started_at) = match (&room.current_word, room.round_started_at) {
        (Some(word), Some(started_at)) if room.phase == TurnPhase::RoundActive => {
            (word, started_at)
        }
        _ => return Err(GuessRejection::NoActiveWord),
    };

    let player = room
        .player(player_id)
        .ok_or(GuessRejection::PlayerNotFound)?;
    if room.is_drawer(player_id) {
        return Err(GuessRejection::IsDrawer);
    }
    if player.has_guessed_correctly {
        return Err(GuessRejection::AlreadyGuessed);
    }

    let duration = room.settings.round_duration_seconds;
    let elapsed_seconds = ((now - started_at).num_milliseconds() as f64 / 1000.0).max(0.0);
    if elapsed_seconds > duration as f64 {
        return Err(GuessRejection::TooLate);
    }

    if text.trim().to_lowercase() != *word {
        return Ok(GuessResult {
            is_correct: false,
            points: 0,
            elapsed_seconds,
        });
    }

    Ok(GuessResult {
        is_correct: true,
        points: guesser_points(duration, elapsed_seconds),
        elapsed_seconds,
    })
}

/// Renders the hint shown to guessers: one space separated token per letter,
/// first letter always revealed. With custom hints on, `hint_letters_count - 1`
/// further letters are revealed at random positions.
pub fn generate_hint<R: Rng + ?Sized>(
    word: &str,
    hint_letters_count: u32,
    custom_hints_enabled: bool,
    rng: &mut R,
) -> String {
    let chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return String::new();
    }

    let mut revealed = vec![false; chars.len()];
    revealed[0] = true;

    if custom_hints_enabled && hint_letters_count > 1 {
        let extra = (hint_letters_count as usize - 1).min(chars.len() - 1);
        for index in rand::seq::index::sample(rng, chars.len() - 1, extra) {
            revealed[index + 1] = true;
        }
    }

    chars
        .iter()
        .zip(revealed)
        .map(|(c, shown)| if shown { *c } else { HINT_PLACEHOLDER })
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}
