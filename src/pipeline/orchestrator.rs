// src/pipeline/orchestrator.rs
//
// Top of the pipeline: fetch a format's ladder, enumerate every ranked user in
// the bounded user pool, and report per-user counts when all users are done.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::DownloaderConfig;
use crate::error::FetchError;
use crate::http::{client::decode, ServiceClient};
use crate::model::Ladder;
use crate::pipeline::enumerator::{UserReplayEnumerator, UserReport};
use crate::pipeline::fetcher::ReplayFetcher;
use crate::progress::ProgressObserver;
use crate::sink::{path_component, JsonFileSink, ReplaySink};

/// Per-user line of the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub user: String,
    pub persisted: usize,
    pub failed: usize,
    /// The user's replay listing could not be fetched.
    pub skipped: bool,
}

impl From<UserReport> for UserSummary {
    fn from(report: UserReport) -> Self {
        Self {
            skipped: report.listed.is_none(),
            persisted: report.replays.len(),
            failed: report.failed,
            user: report.user,
        }
    }
}

/// Result of a completed ladder run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub format: String,
    /// One entry per user, in completion order.
    pub users: Vec<UserSummary>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_persisted(&self) -> usize {
        self.users.iter().map(|u| u.persisted).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.users.iter().map(|u| u.failed).sum()
    }

    pub fn skipped_users(&self) -> usize {
        self.users.iter().filter(|u| u.skipped).count()
    }

    pub fn user(&self, user: &str) -> Option<&UserSummary> {
        self.users.iter().find(|u| u.user == user)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut users: Vec<_> = self.users.iter().collect();
        users.sort_by(|a, b| b.persisted.cmp(&a.persisted).then_with(|| a.user.cmp(&b.user)));

        writeln!(f, "Ladder {}: {} users", self.format, self.users.len())?;
        for u in users {
            if u.skipped {
                writeln!(f, "  {:<24} skipped", u.user)?;
            } else {
                writeln!(f, "  {:<24} {:>5} replays ({} failed)", u.user, u.persisted, u.failed)?;
            }
        }
        let elapsed = Duration::from_millis(self.elapsed.as_millis() as u64);
        write!(
            f,
            "Total: {} replays saved, {} failed, {} users skipped in {}",
            self.total_persisted(),
            self.total_failed(),
            self.skipped_users(),
            humantime::format_duration(elapsed)
        )
    }
}

/// Drives a full ladder download.
pub struct LadderOrchestrator {
    config: Arc<DownloaderConfig>,
    client: ServiceClient,
    sink: Arc<JsonFileSink>,
    enumerator: Arc<UserReplayEnumerator>,
    observer: Arc<dyn ProgressObserver>,
}

impl LadderOrchestrator {
    pub fn new(config: DownloaderConfig, observer: Arc<dyn ProgressObserver>) -> Result<Self, FetchError> {
        config.validate()?;
        let config = Arc::new(config);
        let client = ServiceClient::new(config.http.clone())?;
        let sink = Arc::new(JsonFileSink::from_config(&config));
        let replay_sink: Arc<dyn ReplaySink> = sink.clone();
        let fetcher = ReplayFetcher::new(client.clone(), config.clone(), replay_sink);
        let enumerator = Arc::new(UserReplayEnumerator::new(
            client.clone(),
            config.clone(),
            fetcher,
            observer.clone(),
        ));
        Ok(Self { config, client, sink, enumerator, observer })
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    pub fn enumerator(&self) -> &UserReplayEnumerator {
        &self.enumerator
    }

    pub fn fetcher(&self) -> &ReplayFetcher {
        self.enumerator.fetcher()
    }

    pub fn sink(&self) -> &JsonFileSink {
        &self.sink
    }

    /// Fetch the ladder for `format`, saving the raw body when configured.
    pub async fn fetch_ladder(&self, format: &str) -> Result<Ladder, FetchError> {
        let url = self.config.ladder_url(format);
        let body = self.client.get_text(&url, &[]).await?;
        let ladder: Ladder = decode(&url, &body)?;

        if self.config.save_ladder {
            let name = format!("{}.json", path_component(format));
            match self.sink.write_aux(&name, body.into_bytes()).await {
                Ok(path) => info!("Saved ladder snapshot to {}", path.display()),
                Err(e) => warn!("Could not save ladder snapshot: {}", e),
            }
        }
        Ok(ladder)
    }

    /// Download every replay of every ranked user of `format`.
    ///
    /// Fails only if the output tree cannot be created or the ladder cannot
    /// be fetched; in that case no user or replay requests are made.
    pub async fn run(&self, format: &str) -> Result<RunSummary, FetchError> {
        let started = Instant::now();
        if let Err(e) = self.sink.prepare().await {
            error!("Cannot create output directory {}: {}", self.sink.root().display(), e);
            self.observer.finish();
            return Err(e);
        }

        let ladder = match self.fetch_ladder(format).await {
            Ok(ladder) => ladder,
            Err(e) => {
                error!("Failed to download ladder for {}: {}", format, e);
                self.observer.finish();
                return Err(e);
            }
        };

        let users = ladder.distinct_users();
        info!("Ladder {} lists {} users", format, users.len());
        self.observer.set_total(users.len() as u64);

        let user_permits = Arc::new(Semaphore::new(self.config.user_workers));
        let mut tasks = FuturesUnordered::new();
        for user in users {
            let permits = user_permits.clone();
            let enumerator = self.enumerator.clone();
            let task_user = user.clone();
            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                UserSummary::from(enumerator.enumerate_report(&task_user).await)
            });
            tasks.push(async move { (user, handle.await) });
        }

        let mut summary = RunSummary { format: format.to_string(), users: Vec::new(), elapsed: Duration::ZERO };
        while let Some((user, joined)) = tasks.next().await {
            match joined {
                Ok(user_summary) => {
                    if !user_summary.skipped {
                        info!("Downloaded {} replays for user {}", user_summary.persisted, user);
                    }
                    summary.users.push(user_summary);
                }
                Err(e) => {
                    error!("Error processing user {}: {}", user, e);
                    summary.users.push(UserSummary { user, persisted: 0, failed: 0, skipped: true });
                }
            }
            self.observer.advance();
        }

        self.observer.finish();
        summary.elapsed = started.elapsed();
        Ok(summary)
    }
}
