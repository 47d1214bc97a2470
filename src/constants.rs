// src/constants.rs
//
// Centralized constants for replaydl to avoid hardcoded values throughout the codebase

/// Host serving the ranked ladder (`/ladder/<format>.json`)
pub const DEFAULT_LADDER_BASE_URL: &str = "https://pokemonshowdown.com";

/// Host serving replay search results and individual replays
pub const DEFAULT_REPLAY_BASE_URL: &str = "https://replay.pokemonshowdown.com";

/// Format downloaded when none is given on the command line
pub const DEFAULT_FORMAT: &str = "gen8ou";

/// Root of the output tree
pub const DEFAULT_OUTPUT_DIR: &str = "info";

/// Sub-directory of the output root that holds every replay
pub const ALL_REPLAYS_DIR: &str = "all";

/// Concurrent user enumerations (outer pool)
pub const DEFAULT_USER_WORKERS: usize = 10;

/// Concurrent replay fetches (inner pool, shared across users)
pub const DEFAULT_REPLAY_WORKERS: usize = 10;

/// Default connect timeout for the HTTP client (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout for the HTTP client (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("replaydl/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Environment variable overrides
// ============================================================================

pub const ENV_LADDER_URL: &str = "REPLAYDL_LADDER_URL";
pub const ENV_REPLAY_URL: &str = "REPLAYDL_REPLAY_URL";
pub const ENV_OUTPUT_DIR: &str = "REPLAYDL_OUTPUT_DIR";
pub const ENV_USER_WORKERS: &str = "REPLAYDL_USER_WORKERS";
pub const ENV_REPLAY_WORKERS: &str = "REPLAYDL_REPLAY_WORKERS";
