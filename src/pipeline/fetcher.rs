// src/pipeline/fetcher.rs
//
// Unit of work for a replay worker: GET one replay, parse it, persist it.

use std::sync::Arc;

use tracing::debug;

use crate::config::DownloaderConfig;
use crate::error::FetchError;
use crate::http::ServiceClient;
use crate::log_parser;
use crate::model::{RawReplayPayload, Replay};
use crate::sink::ReplaySink;

/// Fetches, parses and persists single replays. Cheap to clone into tasks.
#[derive(Clone)]
pub struct ReplayFetcher {
    client: ServiceClient,
    config: Arc<DownloaderConfig>,
    sink: Arc<dyn ReplaySink>,
}

impl ReplayFetcher {
    pub fn new(client: ServiceClient, config: Arc<DownloaderConfig>, sink: Arc<dyn ReplaySink>) -> Self {
        Self { client, config, sink }
    }

    /// Fetch `replay` (a bare id, `<id>.json`, or a full replay URL).
    ///
    /// One GET, no retry. Nothing is written unless the fetch and decode
    /// both succeed.
    pub async fn fetch(&self, replay: &str) -> Result<Replay, FetchError> {
        self.fetch_for(replay, None).await
    }

    /// As [`fetch`](Self::fetch), recording `owner` as the user whose listing
    /// produced this replay.
    pub async fn fetch_for(&self, replay: &str, owner: Option<&str>) -> Result<Replay, FetchError> {
        let url = self.config.replay_url(replay);
        let mut payload: RawReplayPayload = self.client.get_json(&url, &[]).await?;
        if payload.id.is_none() {
            payload.id = Some(self.config.replay_id(replay).to_string());
        }

        let parsed = log_parser::parse_payload(&payload);
        let path = self.sink.persist(&parsed, owner).await?;
        debug!("Wrote {} to {}", parsed.id, path.display());
        Ok(parsed)
    }
}
