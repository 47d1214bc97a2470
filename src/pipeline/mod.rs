// src/pipeline/mod.rs
//
// The three layers of a download run:
//
//   LadderOrchestrator ─▶ UserReplayEnumerator ─▶ ReplayFetcher ─▶ log_parser ─▶ sink
//
// Each arrow is a task in a bounded pool; results come back through the
// collecting task in completion order.

pub mod enumerator;
pub mod fetcher;
pub mod orchestrator;

pub use enumerator::{UserReplayEnumerator, UserReport};
pub use fetcher::ReplayFetcher;
pub use orchestrator::{LadderOrchestrator, RunSummary, UserSummary};
