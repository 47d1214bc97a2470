// src/sink.rs
//
// Output sink for parsed replays: one pretty-printed JSON file per replay id.
//
// Many fetch tasks write into the same directories at once. Directory creation
// goes through a single guarded path and is idempotent; each file is written to
// a private temp file in the target directory and renamed into place, so two
// tasks persisting the same replay never interleave bytes.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::DownloaderConfig;
use crate::constants::ALL_REPLAYS_DIR;
use crate::error::FetchError;
use crate::model::Replay;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static regex"));

/// Single path component for `raw`: anything outside `[A-Za-z0-9._-]` becomes `_`,
/// and a leading dot is escaped so it can never name `.`/`..` or a hidden file.
pub fn path_component(raw: &str) -> String {
    let mut name = UNSAFE_FILENAME_CHARS.replace_all(raw, "_").into_owned();
    if name.is_empty() || name.starts_with('.') {
        name.insert(0, '_');
    }
    name
}

pub fn replay_file_name(id: &str) -> String {
    format!("{}.json", path_component(id))
}

/// Destination for parsed replays.
#[async_trait]
pub trait ReplaySink: Send + Sync {
    /// Persist `replay`. `owner` is the user whose listing produced it, if any.
    /// Returns the primary path written.
    async fn persist(&self, replay: &Replay, owner: Option<&str>) -> Result<PathBuf, FetchError>;
}

/// Idempotent, race-free `create_dir_all` shared by every writer of one tree.
#[derive(Debug, Default)]
pub struct DirGuard {
    created: Mutex<HashSet<PathBuf>>,
}

impl DirGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `dir` (and parents) unless this guard already has.
    /// A directory that already exists on disk is not an error.
    pub async fn ensure(&self, dir: &Path) -> Result<(), FetchError> {
        let mut created = self.created.lock().await;
        if created.contains(dir) {
            return Ok(());
        }
        match tokio::fs::create_dir_all(dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(e) => return Err(FetchError::persist(dir, e)),
        }
        debug!("Created directory {}", dir.display());
        created.insert(dir.to_path_buf());
        Ok(())
    }
}

/// Writes `<root>/all/<id>.json`, optionally mirrored to `<root>/<owner>/<id>.json`.
#[derive(Debug)]
pub struct JsonFileSink {
    root: PathBuf,
    mirror_by_user: bool,
    dirs: DirGuard,
}

impl JsonFileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), mirror_by_user: false, dirs: DirGuard::new() }
    }

    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self::new(&config.output_dir).with_user_mirror(config.mirror_by_user)
    }

    pub fn with_user_mirror(mut self, on: bool) -> Self {
        self.mirror_by_user = on;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn all_dir(&self) -> PathBuf {
        self.root.join(ALL_REPLAYS_DIR)
    }

    /// Path the replay with `id` is written to.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.all_dir().join(replay_file_name(id))
    }

    /// Create the output tree up front.
    pub async fn prepare(&self) -> Result<(), FetchError> {
        self.dirs.ensure(&self.root).await?;
        self.dirs.ensure(&self.all_dir()).await
    }

    /// Write raw bytes to `<root>/<name>`, e.g. a ladder snapshot.
    pub async fn write_aux(&self, name: &str, bytes: Vec<u8>) -> Result<PathBuf, FetchError> {
        self.dirs.ensure(&self.root).await?;
        let path = self.root.join(name);
        write_atomic(path.clone(), bytes).await?;
        Ok(path)
    }

    async fn write_into(&self, dir: PathBuf, id: &str, bytes: Vec<u8>) -> Result<PathBuf, FetchError> {
        self.dirs.ensure(&dir).await?;
        let path = dir.join(replay_file_name(id));
        write_atomic(path.clone(), bytes).await?;
        Ok(path)
    }
}

#[async_trait]
impl ReplaySink for JsonFileSink {
    async fn persist(&self, replay: &Replay, owner: Option<&str>) -> Result<PathBuf, FetchError> {
        let path = self.path_for(&replay.id);
        let bytes = serde_json::to_vec_pretty(replay)
            .map_err(|e| FetchError::persist(&path, std::io::Error::other(e)))?;

        let primary = self.write_into(self.all_dir(), &replay.id, bytes.clone()).await?;
        if self.mirror_by_user {
            if let Some(owner) = owner {
                let user_dir = self.root.join(path_component(owner));
                self.write_into(user_dir, &replay.id, bytes).await?;
            }
        }
        Ok(primary)
    }
}

/// Temp file in the destination directory, then rename over `path`.
async fn write_atomic(path: PathBuf, bytes: Vec<u8>) -> Result<(), FetchError> {
    let target = path.clone();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| FetchError::persist(&path, std::io::Error::other(e)))?
    .map_err(|e| FetchError::persist(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_confined() {
        assert_eq!(replay_file_name("gen8ou-1097585496"), "gen8ou-1097585496.json");
        assert_eq!(replay_file_name("../../etc/passwd"), "_.._.._etc_passwd.json");
        assert_eq!(replay_file_name(".."), "_...json");
        assert_eq!(replay_file_name(""), "_.json");
        assert_eq!(replay_file_name("gen9ou-1-abc pw"), "gen9ou-1-abc_pw.json");
    }

    #[tokio::test]
    async fn dir_guard_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = DirGuard::new();
        let dir = tmp.path().join("a/b");
        guard.ensure(&dir).await.unwrap();
        guard.ensure(&dir).await.unwrap();
        // created outside the guard's knowledge
        let other = tmp.path().join("c");
        std::fs::create_dir(&other).unwrap();
        guard.ensure(&other).await.unwrap();
        assert!(dir.is_dir() && other.is_dir());
    }
}
