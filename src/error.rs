// src/error.rs
//
// Error type shared by every stage of the download pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single network fetch, decode, or persist step.
///
/// Replay- and user-level failures are recovered by the caller; only a
/// failure while fetching the ladder aborts a run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// HTTP status code, when the failure was a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::HttpStatus { .. } | FetchError::Transport { .. })
    }

    pub(crate) fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Persist { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_for_http_errors() {
        let err = FetchError::HttpStatus { url: "https://x/y.json".into(), status: 404 };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_network());
        assert_eq!(err.to_string(), "GET https://x/y.json returned HTTP 404");

        let err = FetchError::persist("/tmp/a.json", std::io::Error::other("disk full"));
        assert_eq!(err.status(), None);
        assert!(!err.is_network());
        assert!(err.to_string().contains("/tmp/a.json"));
    }
}
