use std::time::Duration;

use tracing::warn;

/// Tunables for the turn engine.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Grace period between a resolved round and the next turn, so clients can show the reveal
    pub next_turn_delay: Duration,
    /// How long a reconnection cache entry stays valid
    pub reconnect_ttl: Duration,
    /// Number of candidate words offered to each drawer
    pub word_options: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            next_turn_delay: Duration::from_secs(3),
            reconnect_ttl: Duration::from_secs(24 * 60 * 60),
            word_options: 3,
        }
    }
}

impl GameConfig {
    /// Reads overrides from `NEXT_TURN_DELAY_MS` and `RECONNECT_TTL_HOURS`, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let next_turn_delay = std::env::var("NEXT_TURN_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.next_turn_delay);

        let reconnect_ttl = std::env::var("RECONNECT_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|hours| Duration::from_secs(hours * 60 * 60))
            .unwrap_or(defaults.reconnect_ttl);

        Self {
            next_turn_delay,
            reconnect_ttl,
            ..defaults
        }
    }
}

/// Process-level settings: where to listen and how bearer tokens are checked.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_expiration_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            jwt_secret: "dev-secret-change-me".to_string(),
            token_expiration_days: 365,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `JWT_SECRET` and `SESSION_EXPIRATION_DAYS`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        if std::env::var("JWT_SECRET").is_err() {
            warn!("JWT_SECRET not set, using the development secret");
        }

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_expiration_days: std::env::var("SESSION_EXPIRATION_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.token_expiration_days),
        }
    }
}
