// Public API
pub use ledger::{GameScore, InMemoryScoreLedger, ScoreLedger};
pub use orchestrator::{ClientContext, JoinOutcome, RoomOrchestrator, RoomOrchestratorBuilder};
pub use scoring::{GuessRejection, GuessResult};
pub use timer::{TimerKind, TurnTimerManager};

// Internal modules
pub mod ledger;
pub(crate) mod locks;
mod orchestrator;
pub mod scoring;
pub mod timer;
mod turns;
