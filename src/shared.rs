use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::game::RoomOrchestrator;
use crate::room::RoomService;
use crate::session::TokenConfig;
use crate::stats::LeaderboardService;
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RoomOrchestrator>,
    pub room_service: Arc<RoomService>,
    pub leaderboard: Arc<LeaderboardService>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub token_config: TokenConfig,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<RoomOrchestrator>,
        room_service: Arc<RoomService>,
        leaderboard: Arc<LeaderboardService>,
        connection_manager: Arc<dyn ConnectionManager>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            orchestrator,
            room_service,
            leaderboard,
            connection_manager,
            token_config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Message safe to show a client, without the variant prefix
    pub fn client_message(&self) -> String {
        match self {
            AppError::JwtError(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::DatabaseError(_) | AppError::Internal => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::InMemoryScoreLedger;
    use crate::room::repository::InMemoryRoomRepository;
    use crate::stats::InMemoryLeaderboardRepository;
    use crate::websockets::InMemoryConnectionManager;

    pub const TEST_SECRET: &str = "test-secret";

    /// In-memory AppState for handler tests
    pub struct AppStateBuilder {
        config: GameConfig,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                config: GameConfig::default(),
            }
        }

        pub fn with_config(mut self, config: GameConfig) -> Self {
            self.config = config;
            self
        }

        pub fn build(self) -> AppState {
            let room_service = Arc::new(RoomService::new(Arc::new(InMemoryRoomRepository::new())));
            let connection_manager: Arc<dyn ConnectionManager> =
                Arc::new(InMemoryConnectionManager::new());
            let ledger = Arc::new(InMemoryScoreLedger::new());
            let leaderboard = Arc::new(LeaderboardService::new(
                Arc::new(InMemoryLeaderboardRepository::new()),
                ledger.clone(),
            ));

            let orchestrator =
                RoomOrchestrator::builder(room_service.clone(), connection_manager.clone())
                    .with_ledger(ledger)
                    .with_leaderboard(leaderboard.clone())
                    .with_config(self.config)
                    .build();

            AppState::new(
                orchestrator,
                room_service,
                leaderboard,
                connection_manager,
                TokenConfig::with_secret(TEST_SECRET, 1),
            )
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
