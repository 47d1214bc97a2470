// src/lib.rs
//
// Crate root — public re-exports for the replay downloader.

pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod log_parser;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod sink;

pub use config::{DownloaderConfig, DownloaderConfigBuilder};
pub use error::FetchError;
pub use http::{HttpClientConfig, ServiceClient};
pub use log_parser::{parse, parse_payload};
pub use model::{
    Ladder, LadderEntry, PlayerSlot, RawReplayPayload, Replay, ReplayMetadata, Roster,
    UserReplaySummary,
};
pub use pipeline::{
    LadderOrchestrator, ReplayFetcher, RunSummary, UserReplayEnumerator, UserReport, UserSummary,
};
pub use progress::{CounterSnapshot, ProgressBarObserver, ProgressObserver, TracingObserver};
pub use sink::{DirGuard, JsonFileSink, ReplaySink};
