// src/config.rs
//
// Runtime configuration for a download run: service endpoints, output tree,
// and the two worker-pool sizes.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::constants::*;
use crate::error::FetchError;
use crate::http::HttpClientConfig;

/// Configuration shared by the fetcher, enumerator, and orchestrator.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Base URL of the ladder host, without trailing slash
    pub ladder_base_url: String,
    /// Base URL of the replay host, without trailing slash
    pub replay_base_url: String,
    /// Root of the output tree; replays land in `<output_dir>/all/`
    pub output_dir: PathBuf,
    /// Concurrent user enumerations
    pub user_workers: usize,
    /// Concurrent replay fetches across all users
    pub replay_workers: usize,
    /// Also copy each replay to `<output_dir>/<userid>/`
    pub mirror_by_user: bool,
    /// Save the raw ladder body to `<output_dir>/<format>.json`
    pub save_ladder: bool,
    pub http: HttpClientConfig,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            ladder_base_url: DEFAULT_LADDER_BASE_URL.to_string(),
            replay_base_url: DEFAULT_REPLAY_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            user_workers: DEFAULT_USER_WORKERS,
            replay_workers: DEFAULT_REPLAY_WORKERS,
            mirror_by_user: false,
            save_ladder: true,
            http: HttpClientConfig::default(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

impl DownloaderConfig {
    /// Defaults overridden by any `REPLAYDL_*` variables that are set.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = std::env::var(ENV_LADDER_URL) {
            cfg.ladder_base_url = url;
        }
        if let Ok(url) = std::env::var(ENV_REPLAY_URL) {
            cfg.replay_base_url = url;
        }
        if let Ok(dir) = std::env::var(ENV_OUTPUT_DIR) {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Some(n) = env_parse(ENV_USER_WORKERS) {
            cfg.user_workers = n;
        }
        if let Some(n) = env_parse(ENV_REPLAY_WORKERS) {
            cfg.replay_workers = n;
        }
        cfg.normalized()
    }

    fn normalized(mut self) -> Self {
        self.ladder_base_url = self.ladder_base_url.trim_end_matches('/').to_string();
        self.replay_base_url = self.replay_base_url.trim_end_matches('/').to_string();
        self
    }

    /// Reject settings that would stall or misdirect a run.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.user_workers == 0 {
            return Err(FetchError::InvalidConfig("user_workers must be at least 1".into()));
        }
        if self.replay_workers == 0 {
            return Err(FetchError::InvalidConfig("replay_workers must be at least 1".into()));
        }
        for url in [&self.ladder_base_url, &self.replay_base_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(FetchError::InvalidConfig(format!("not an http(s) URL: {url}")));
            }
        }
        Ok(())
    }

    pub fn ladder_url(&self, format: &str) -> String {
        format!("{}/ladder/{}.json", self.ladder_base_url, format)
    }

    pub fn user_search_url(&self) -> String {
        format!("{}/search.json", self.replay_base_url)
    }

    /// Replay id from either a bare id (`gen8ou-123`, `gen8ou-123.json`)
    /// or a full replay URL on the configured host.
    pub fn replay_id<'a>(&self, input: &'a str) -> &'a str {
        let id = input
            .strip_prefix(self.replay_base_url.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(input);
        id.strip_suffix(".json").unwrap_or(id)
    }

    pub fn replay_url(&self, input: &str) -> String {
        format!("{}/{}.json", self.replay_base_url, self.replay_id(input))
    }

    pub fn all_replays_dir(&self) -> PathBuf {
        self.output_dir.join(ALL_REPLAYS_DIR)
    }
}

/// Builder for creating downloader configurations
#[derive(Debug, Default)]
pub struct DownloaderConfigBuilder {
    config: DownloaderConfig,
}

impl DownloaderConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `REPLAYDL_*` environment overrides instead of plain defaults
    pub fn from_env() -> Self {
        Self { config: DownloaderConfig::from_env() }
    }

    pub fn ladder_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.ladder_base_url = url.into();
        self
    }

    pub fn replay_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.replay_base_url = url.into();
        self
    }

    /// Point both endpoints at one host (handy for mirrors and tests)
    pub fn base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.ladder_base_url(url.clone()).replay_base_url(url)
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn user_workers(mut self, n: usize) -> Self {
        self.config.user_workers = n;
        self
    }

    pub fn replay_workers(mut self, n: usize) -> Self {
        self.config.replay_workers = n;
        self
    }

    pub fn mirror_by_user(mut self, on: bool) -> Self {
        self.config.mirror_by_user = on;
        self
    }

    pub fn save_ladder(mut self, on: bool) -> Self {
        self.config.save_ladder = on;
        self
    }

    pub fn http(mut self, http: HttpClientConfig) -> Self {
        self.config.http = http;
        self
    }

    /// Build and validate the final configuration
    pub fn build(self) -> Result<DownloaderConfig, FetchError> {
        let config = self.config.normalized();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_and_trims() {
        let cfg = DownloaderConfigBuilder::new()
            .base_url("http://127.0.0.1:9000/")
            .user_workers(3)
            .replay_workers(7)
            .output_dir("/tmp/out")
            .build()
            .unwrap();

        assert_eq!(cfg.ladder_url("gen3ou"), "http://127.0.0.1:9000/ladder/gen3ou.json");
        assert_eq!(cfg.user_search_url(), "http://127.0.0.1:9000/search.json");
        assert_eq!(cfg.user_workers, 3);
        assert_eq!(cfg.replay_workers, 7);
        assert_eq!(cfg.all_replays_dir(), PathBuf::from("/tmp/out/all"));
    }

    #[test]
    fn zero_workers_rejected() {
        let err = DownloaderConfigBuilder::new().replay_workers(0).build().unwrap_err();
        assert!(matches!(err, FetchError::InvalidConfig(_)));
        let err = DownloaderConfigBuilder::new().user_workers(0).build().unwrap_err();
        assert!(matches!(err, FetchError::InvalidConfig(_)));
    }

    #[test]
    fn non_http_base_rejected() {
        assert!(DownloaderConfigBuilder::new().base_url("ftp://x").build().is_err());
    }

    #[test]
    fn replay_url_accepts_id_or_url() {
        let cfg = DownloaderConfig::default();
        let want = "https://replay.pokemonshowdown.com/gen8doublesubers-1097585496.json";
        assert_eq!(cfg.replay_url("gen8doublesubers-1097585496"), want);
        assert_eq!(cfg.replay_url("gen8doublesubers-1097585496.json"), want);
        assert_eq!(cfg.replay_url(want), want);
        assert_eq!(cfg.replay_id(want), "gen8doublesubers-1097585496");
    }
}
