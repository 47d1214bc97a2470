// src/pipeline/enumerator.rs
//
// Per-user fan-out: list a user's replays, then fetch each one in the
// bounded replay pool.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::config::DownloaderConfig;
use crate::error::FetchError;
use crate::http::ServiceClient;
use crate::model::{Replay, UserReplaySummary};
use crate::pipeline::fetcher::ReplayFetcher;
use crate::progress::ProgressObserver;

/// Outcome of enumerating one user.
#[derive(Debug, Default)]
pub struct UserReport {
    pub user: String,
    /// Replays listed for the user; `None` when the listing itself failed.
    pub listed: Option<usize>,
    /// Successfully persisted replays, in completion order.
    pub replays: Vec<Replay>,
    pub failed: usize,
}

/// Lists a user's replays and fetches them with at most `replay_workers`
/// fetches in flight.
///
/// The permit pool is owned by the enumerator, so every user enumerated
/// through the same instance shares one cap.
pub struct UserReplayEnumerator {
    client: ServiceClient,
    config: Arc<DownloaderConfig>,
    fetcher: ReplayFetcher,
    permits: Arc<Semaphore>,
    observer: Arc<dyn ProgressObserver>,
}

impl UserReplayEnumerator {
    pub fn new(
        client: ServiceClient,
        config: Arc<DownloaderConfig>,
        fetcher: ReplayFetcher,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.replay_workers));
        Self { client, config, fetcher, permits, observer }
    }

    pub fn fetcher(&self) -> &ReplayFetcher {
        &self.fetcher
    }

    /// One GET of the user's replay listing.
    pub async fn list(&self, user: &str) -> Result<Vec<UserReplaySummary>, FetchError> {
        self.client
            .get_json(&self.config.user_search_url(), &[("user", user)])
            .await
    }

    /// Persisted replays for `user`, in completion order. Never fails:
    /// a failed listing yields nothing and failed replays are left out.
    pub async fn enumerate(&self, user: &str) -> Vec<Replay> {
        self.enumerate_report(user).await.replays
    }

    pub async fn enumerate_report(&self, user: &str) -> UserReport {
        let mut report = UserReport { user: user.to_string(), ..Default::default() };

        let listing = match self.list(user).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Skipping user {}: could not fetch replay list", user);
                self.observer.record_failure(user, &e);
                return report;
            }
        };
        report.listed = Some(listing.len());

        let mut tasks = FuturesUnordered::new();
        for summary in listing {
            let fetcher = self.fetcher.clone();
            let permits = self.permits.clone();
            let owner = user.to_string();
            tasks.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let result = fetcher.fetch_for(&summary.id, Some(&owner)).await;
                (summary.id, result)
            }));
        }

        while let Some(joined) = tasks.next().await {
            match joined {
                Ok((id, Ok(replay))) => {
                    self.observer.record_success(&id);
                    report.replays.push(replay);
                }
                Ok((id, Err(e))) => {
                    self.observer.record_failure(&id, &e);
                    report.failed += 1;
                }
                Err(e) => {
                    error!("Replay task for user {} did not complete: {}", user, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
