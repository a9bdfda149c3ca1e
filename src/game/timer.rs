use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::room::models::RoomId;

/// What an armed timer is counting down to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The guessing window of an active round
    RoundClock,
    /// Grace period between a resolved round and the next turn
    NextTurnDelay,
}

struct ArmedTimer {
    token: u64,
    kind: TimerKind,
    handle: JoinHandle<()>,
}

/// Owns at most one pending timer per room.
///
/// Arming a room replaces its previous timer. A fired timer removes itself from
/// the map before running its callback, so a callback runs at most once and a
/// cancel that loses the race simply finds nothing to cancel.
pub struct TurnTimerManager {
    timers: Arc<Mutex<HashMap<RoomId, ArmedTimer>>>,
    next_token: AtomicU64,
}

impl Default for TurnTimerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnTimerManager {
    pub fn new() -> Self {
        Self {
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_token: AtomicU64::new(1),
        }
    }

    /// Arms `kind` for `room_id`, cancelling whatever was armed before
    pub async fn start<F, Fut>(&self, room_id: RoomId, kind: TimerKind, delay: Duration, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);

        let mut guard = self.timers.lock().await;
        if let Some(previous) = guard.remove(&room_id) {
            debug!(room_id, previous = ?previous.kind, "Replacing armed timer");
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let claimed = {
                let mut timers = timers.lock().await;
                match timers.get(&room_id) {
                    Some(armed) if armed.token == token => {
                        timers.remove(&room_id);
                        true
                    }
                    _ => false,
                }
            };

            if claimed {
                debug!(room_id, kind = ?kind, "Timer fired");
                on_fire().await;
            }
        });

        debug!(room_id, kind = ?kind, delay_ms = delay.as_millis() as u64, "Timer armed");
        guard.insert(
            room_id,
            ArmedTimer {
                token,
                kind,
                handle,
            },
        );
    }

    /// Cancels the room's pending timer. No-op when nothing is armed.
    pub async fn cancel(&self, room_id: RoomId) -> bool {
        match self.timers.lock().await.remove(&room_id) {
            Some(armed) => {
                armed.handle.abort();
                debug!(room_id, kind = ?armed.kind, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    pub async fn armed_kind(&self, room_id: RoomId) -> Option<TimerKind> {
        self.timers.lock().await.get(&room_id).map(|t| t.kind)
    }

    pub async fn is_armed(&self, room_id: RoomId) -> bool {
        self.timers.lock().await.contains_key(&room_id)
    }

    pub async fn armed_count(&self) -> usize {
        self.timers.lock().await.len()
    }
}
