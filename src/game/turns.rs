use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::{
    ledger::GameScore,
    orchestrator::{ClientContext, RoomOrchestrator},
    scoring::{self, GuessRejection},
    timer::TimerKind,
};
use crate::{
    room::{
        models::{PlayerModel, RoomId, RoomModel, RoomStatus, TurnAdvance, TurnPhase},
        types::scores_of,
    },
    shared::AppError,
    websockets::{messages::TurnPayload, WebSocketMessage},
};

const DRAWER_CHAT_NOTICE: &str = "You can't chat while drawing!";
const ALREADY_GUESSED_NOTICE: &str = "You already guessed correctly! Wait for the next round.";
const TIME_UP_NOTICE: &str = "Time is up! Wait for the next round.";

impl RoomOrchestrator {
    /// Drawer picks one of the offered words, which starts the round clock
    #[instrument(skip(self, client), fields(identity = %client.identity))]
    pub async fn select_word(
        self: &Arc<Self>,
        client: &ClientContext,
        word: &str,
    ) -> Result<(), AppError> {
        let (room, player) = self.require_membership(&client.identity).await?;

        let room_lock = self.room_lock(room.id).await;
        let _guard = room_lock.lock().await;

        let mut room = self.rooms.require_room(room.id).await?;
        if room.status != RoomStatus::Playing {
            return Err(AppError::Conflict("Game is not in progress".to_string()));
        }
        if !room.is_drawer(player.id) {
            return Err(AppError::Forbidden(
                "Only the drawer can select a word".to_string(),
            ));
        }

        let word = word.trim().to_lowercase();
        match room.phase {
            TurnPhase::AwaitingWord => {}
            TurnPhase::RoundActive if room.current_word.as_deref() == Some(word.as_str()) => {
                debug!(room_id = room.id, "Repeated word selection ignored");
                return Ok(());
            }
            _ => {
                return Err(AppError::Conflict(
                    "A word has already been selected".to_string(),
                ))
            }
        }

        let offered = room
            .word_options
            .as_ref()
            .is_some_and(|options| options.iter().any(|option| *option == word));
        if !offered {
            return Err(AppError::BadRequest(
                "Word is not one of the offered options".to_string(),
            ));
        }

        let hint = scoring::generate_hint(
            &word,
            room.settings.hint_letters_count,
            room.settings.custom_hints_enabled,
            &mut rand::rng(),
        );
        let word_length = word.chars().count();
        room.begin_round(word, hint.clone(), Utc::now());
        self.rooms.update_room(&room).await?;

        let duration = room.settings.round_duration_seconds;
        info!(
            room_id = room.id,
            round = room.current_round,
            drawer_id = player.id,
            duration,
            "Round started"
        );
        self.broadcaster
            .to_room(
                &room,
                &WebSocketMessage::drawing_started(hint, word_length, duration),
            )
            .await;

        let this = Arc::clone(self);
        let (room_id, turn_seq) = (room.id, room.turn_seq);
        self.timers
            .start(
                room_id,
                TimerKind::RoundClock,
                Duration::from_secs(u64::from(duration)),
                move || async move {
                    if let Err(e) = this.resolve_round(room_id, turn_seq, false).await {
                        warn!(room_id, error = %e, "Failed to resolve round on timeout");
                    }
                },
            )
            .await;

        Ok(())
    }

    /// Chat line from a player. Correct guesses are scored; everything else is
    /// relayed as chat or answered privately.
    #[instrument(skip(self, client, text), fields(identity = %client.identity))]
    pub async fn submit_guess(
        self: &Arc<Self>,
        client: &ClientContext,
        text: &str,
    ) -> Result<(), AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let (room, player) = self.require_membership(&client.identity).await?;

        let room_lock = self.room_lock(room.id).await;
        let _guard = room_lock.lock().await;

        let mut room = self.rooms.require_room(room.id).await?;
        let player = room
            .player(player.id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Player not found in room".to_string()))?;

        let now = Utc::now();
        let result = match scoring::evaluate_guess(&room, player.id, text, now) {
            Ok(result) => result,
            Err(GuessRejection::IsDrawer) => {
                return self.notify(&player, DRAWER_CHAT_NOTICE).await;
            }
            Err(GuessRejection::AlreadyGuessed) => {
                return self.notify(&player, ALREADY_GUESSED_NOTICE).await;
            }
            Err(GuessRejection::TooLate) => {
                debug!(room_id = room.id, "Guess arrived after the round clock");
                return self.notify(&player, TIME_UP_NOTICE).await;
            }
            Err(GuessRejection::NoActiveWord) => {
                self.broadcaster
                    .to_room(
                        &room,
                        &WebSocketMessage::chat(player.username.clone(), text.to_string(), false),
                    )
                    .await;
                return Ok(());
            }
            Err(GuessRejection::PlayerNotFound) => {
                return Err(AppError::NotFound("Player not found in room".to_string()));
            }
        };

        if !result.is_correct {
            self.broadcaster
                .to_room(
                    &room,
                    &WebSocketMessage::chat(player.username.clone(), text.to_string(), false),
                )
                .await;
            return Ok(());
        }

        let drawer = room.drawer().cloned();
        let drawer_bonus = scoring::drawer_points(
            room.settings.round_duration_seconds,
            result.elapsed_seconds,
        );

        // Ledger first: if it fails the room is left untouched
        self.ledger
            .record(GameScore {
                room_id: room.id,
                game_number: room.game_number,
                round: room.current_round,
                player_id: player.id,
                identity: player.identity.clone(),
                points: result.points,
                guessed_word: room.current_word.clone(),
                elapsed_seconds: result.elapsed_seconds,
                recorded_at: now,
            })
            .await?;
        if let Some(drawer) = drawer.as_ref().filter(|_| drawer_bonus > 0) {
            self.ledger
                .record(GameScore {
                    room_id: room.id,
                    game_number: room.game_number,
                    round: room.current_round,
                    player_id: drawer.id,
                    identity: drawer.identity.clone(),
                    points: drawer_bonus,
                    guessed_word: None,
                    elapsed_seconds: result.elapsed_seconds,
                    recorded_at: now,
                })
                .await?;
        }

        room.award_correct_guess(player.id, result.points, drawer_bonus, now);
        self.rooms.update_room(&room).await?;

        info!(
            room_id = room.id,
            player_id = player.id,
            points = result.points,
            drawer_bonus,
            elapsed = result.elapsed_seconds,
            "Correct guess"
        );

        self.broadcaster
            .to_room(
                &room,
                &WebSocketMessage::chat(
                    player.username.clone(),
                    format!("guessed the word! (+{} points)", result.points),
                    true,
                ),
            )
            .await;
        self.broadcaster
            .to_room(&room, &WebSocketMessage::scores_updated(scores_of(&room)))
            .await;

        if room.non_drawers_all_guessed() {
            self.resolve_round_locked(&mut room, true).await?;
        }

        Ok(())
    }

    async fn notify(&self, player: &PlayerModel, text: &str) -> Result<(), AppError> {
        self.broadcaster
            .to_connection(&player.connection_id, &WebSocketMessage::system_chat(text))
            .await;
        Ok(())
    }

    /// Round clock entry point. Ignored unless `turn_seq` still names the active round.
    pub async fn resolve_round(
        self: &Arc<Self>,
        room_id: RoomId,
        turn_seq: u64,
        all_guessed: bool,
    ) -> Result<(), AppError> {
        let room_lock = self.room_lock(room_id).await;
        let _guard = room_lock.lock().await;

        let Some(mut room) = self.rooms.get_room(room_id).await? else {
            debug!(room_id, "Room gone, ignoring round timeout");
            return Ok(());
        };
        if room.turn_seq != turn_seq || room.phase != TurnPhase::RoundActive {
            debug!(room_id, turn_seq, current = room.turn_seq, "Stale round timeout ignored");
            return Ok(());
        }

        self.resolve_round_locked(&mut room, all_guessed).await
    }

    /// Ends the active round and schedules the next turn. Caller holds the room lock.
    pub(super) async fn resolve_round_locked(
        self: &Arc<Self>,
        room: &mut RoomModel,
        all_guessed: bool,
    ) -> Result<(), AppError> {
        self.timers.cancel(room.id).await;
        room.resolve_round();
        self.rooms.update_room(room).await?;

        info!(
            room_id = room.id,
            round = room.current_round,
            all_guessed,
            "Round resolved"
        );
        self.broadcaster
            .to_room(
                room,
                &WebSocketMessage::time_up(room.current_word.clone(), scores_of(room), all_guessed),
            )
            .await;

        let this = Arc::clone(self);
        let (room_id, turn_seq) = (room.id, room.turn_seq);
        self.timers
            .start(
                room_id,
                TimerKind::NextTurnDelay,
                self.config.next_turn_delay,
                move || async move {
                    if let Err(e) = this.next_turn_if_current(room_id, turn_seq).await {
                        warn!(room_id, error = %e, "Failed to advance turn");
                    }
                },
            )
            .await;

        Ok(())
    }

    /// Advances a playing room to its next turn right away
    #[instrument(skip(self))]
    pub async fn next_turn(self: &Arc<Self>, room_id: RoomId) -> Result<(), AppError> {
        let room_lock = self.room_lock(room_id).await;
        let _guard = room_lock.lock().await;

        let mut room = self.rooms.require_room(room_id).await?;
        if room.status != RoomStatus::Playing {
            debug!(room_id, status = %room.status, "Room not playing, no turn to advance");
            return Ok(());
        }

        self.timers.cancel(room_id).await;
        self.advance_turn(&mut room, false).await
    }

    async fn next_turn_if_current(
        self: &Arc<Self>,
        room_id: RoomId,
        turn_seq: u64,
    ) -> Result<(), AppError> {
        let room_lock = self.room_lock(room_id).await;
        let _guard = room_lock.lock().await;

        let Some(mut room) = self.rooms.get_room(room_id).await? else {
            return Ok(());
        };
        if room.turn_seq != turn_seq || room.status != RoomStatus::Playing {
            debug!(room_id, turn_seq, current = room.turn_seq, "Stale turn delay ignored");
            return Ok(());
        }

        self.advance_turn(&mut room, false).await
    }

    /// Moves to the next drawer or ends the game. Caller holds the room lock.
    pub(super) async fn advance_turn(
        self: &Arc<Self>,
        room: &mut RoomModel,
        keep_index: bool,
    ) -> Result<(), AppError> {
        let options = self.words.random_words(self.config.word_options);
        let outcome = room.advance_turn(options, keep_index);
        self.rooms.update_room(room).await?;

        match outcome {
            TurnAdvance::Continued => {
                info!(
                    room_id = room.id,
                    round = room.current_round,
                    drawer_index = room.current_drawer_index,
                    "Next turn"
                );
                self.announce_turn(room, false).await;
            }
            TurnAdvance::Finished => {
                self.timers.cancel(room.id).await;
                info!(room_id = room.id, game_number = room.game_number, "Game ended");
                self.broadcaster
                    .to_room(room, &WebSocketMessage::game_ended(scores_of(room)))
                    .await;

                if let Some(leaderboard) = &self.leaderboard {
                    if let Err(e) = leaderboard.record_game_end(room).await {
                        warn!(room_id = room.id, error = %e, "Failed to record finished game");
                    }
                }
            }
        }

        Ok(())
    }

    /// Tells the room whose turn it is and offers the drawer their words
    pub(super) async fn announce_turn(&self, room: &RoomModel, first: bool) {
        let Some(drawer) = room.drawer() else {
            return;
        };

        let turn = TurnPayload {
            round: room.current_round,
            total_rounds: room.settings.total_rounds,
            drawer_id: drawer.id,
            drawer_name: drawer.username.clone(),
            players: scores_of(room),
        };
        let message = if first {
            WebSocketMessage::game_started(turn)
        } else {
            WebSocketMessage::new_turn(turn)
        };
        self.broadcaster.to_room(room, &message).await;

        if let Some(options) = &room.word_options {
            self.broadcaster
                .to_connection(
                    &drawer.connection_id,
                    &WebSocketMessage::select_word(options.clone()),
                )
                .await;
        }
    }

    /// Replays what a reconnecting player missed of the current turn
    pub(super) async fn resend_turn_state(&self, room: &RoomModel, player: &PlayerModel) {
        if room.status != RoomStatus::Playing {
            return;
        }

        match room.phase {
            TurnPhase::AwaitingWord if room.is_drawer(player.id) => {
                if let Some(options) = &room.word_options {
                    self.broadcaster
                        .to_connection(
                            &player.connection_id,
                            &WebSocketMessage::select_word(options.clone()),
                        )
                        .await;
                }
            }
            TurnPhase::RoundActive if !room.is_drawer(player.id) => {
                if let (Some(hint), Some(word)) = (&room.current_hint, &room.current_word) {
                    self.broadcaster
                        .to_connection(
                            &player.connection_id,
                            &WebSocketMessage::drawing_started(
                                hint.clone(),
                                word.chars().count(),
                                room.settings.round_duration_seconds,
                            ),
                        )
                        .await;
                }
            }
            _ => {}
        }
    }
}
