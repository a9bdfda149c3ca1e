use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::room::models::RoomId;
use crate::shared::AppError;

/// Where an identity was last seated. A hint only: the room store stays authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRoomInfo {
    pub room_id: RoomId,
    pub room_code: String,
    pub username: String,
    pub connection_id: String,
    pub joined_at: DateTime<Utc>,
}

/// Identity to room lookup used to restore dropped connections
#[async_trait]
pub trait PlayerRoomCache: Send + Sync {
    /// Stores `info` under `identity`, replacing any previous entry and restarting its TTL
    async fn set(&self, identity: &str, info: PlayerRoomInfo) -> Result<(), AppError>;

    async fn get(&self, identity: &str) -> Result<Option<PlayerRoomInfo>, AppError>;

    /// Points an existing entry at a new connection. Returns false if there was no entry.
    async fn update_connection(
        &self,
        identity: &str,
        connection_id: &str,
    ) -> Result<bool, AppError>;

    async fn remove(&self, identity: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    info: PlayerRoomInfo,
    expires_at: DateTime<Utc>,
}

pub struct InMemoryPlayerRoomCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl Default for InMemoryPlayerRoomCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlayerRoomCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(24))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn from_std_ttl(ttl: std::time::Duration) -> Self {
        Self::with_ttl(Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(24)))
    }
}

#[async_trait]
impl PlayerRoomCache for InMemoryPlayerRoomCache {
    async fn set(&self, identity: &str, info: PlayerRoomInfo) -> Result<(), AppError> {
        debug!(identity = %identity, room_id = info.room_id, "Caching player room");
        let entry = CacheEntry {
            info,
            expires_at: Utc::now() + self.ttl,
        };
        self.entries
            .write()
            .await
            .insert(identity.to_string(), entry);
        Ok(())
    }

    async fn get(&self, identity: &str) -> Result<Option<PlayerRoomInfo>, AppError> {
        {
            let entries = self.entries.read().await;
            match entries.get(identity) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > Utc::now() => {
                    return Ok(Some(entry.info.clone()))
                }
                Some(_) => {}
            }
        }

        debug!(identity = %identity, "Cached player room expired");
        let mut entries = self.entries.write().await;
        if entries
            .get(identity)
            .is_some_and(|entry| entry.expires_at <= Utc::now())
        {
            entries.remove(identity);
        }
        Ok(None)
    }

    async fn update_connection(
        &self,
        identity: &str,
        connection_id: &str,
    ) -> Result<bool, AppError> {
        let Some(mut info) = self.get(identity).await? else {
            return Ok(false);
        };
        info.connection_id = connection_id.to_string();
        self.set(identity, info).await?;
        Ok(true)
    }

    async fn remove(&self, identity: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(identity);
        Ok(())
    }
}
