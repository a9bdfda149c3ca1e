use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::LeaderboardEntryResponse;
use crate::session::IdentityClaims;
use crate::shared::{AppError, AppState};

const DEFAULT_LEADERBOARD_SIZE: usize = 10;
const MAX_LEADERBOARD_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub count: Option<usize>,
}

/// GET /leaderboard?count=N
#[instrument(name = "leaderboard", skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntryResponse>>, AppError> {
    let count = query
        .count
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
        .clamp(1, MAX_LEADERBOARD_SIZE);

    let entries = state.leaderboard.top(count).await?;
    debug!(returned = entries.len(), "Leaderboard served");

    Ok(Json(
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| LeaderboardEntryResponse::from_entry(i + 1, entry))
            .collect(),
    ))
}

/// GET /leaderboard/me
#[instrument(name = "my_stats", skip(state, claims))]
pub async fn my_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
) -> Result<Json<LeaderboardEntryResponse>, AppError> {
    let entry = state
        .leaderboard
        .entry_for(&claims.mobile_number)
        .await?
        .ok_or_else(|| AppError::NotFound("No games played yet".to_string()))?;

    let rank = state
        .leaderboard
        .top(usize::MAX)
        .await?
        .iter()
        .position(|e| e.identity == entry.identity)
        .map_or(0, |i| i + 1);

    Ok(Json(LeaderboardEntryResponse::from_entry(rank, &entry)))
}
