//! Engine configuration from the environment.
//!
//! Supported environment variables:
//! - INNKEEPER_DATA_DIR: directory holding `characters.json` (default: current dir)
//! - INNKEEPER_SERVER_URL: provider proxy base URL
//! - INNKEEPER_AUTH_KEY: value sent as `X-Auth-Key`
//! - INNKEEPER_CACHE_TTL_SECS: freshness window for cached fields (default 300)
//! - INNKEEPER_FETCH_TIMEOUT_SECS: per-fetch deadline (default 30)
//! - INNKEEPER_SCAN_TIMEOUT_SECS: deadline for realm scans and talent trees (default 120)
//!
//! A `--datadir <path>` argument overrides INNKEEPER_DATA_DIR.

use std::path::PathBuf;
use std::time::Duration;

/// Default proxy server URL.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 120;

/// Name of the roster file inside the data dir.
pub const ROSTER_FILE_NAME: &str = "characters.json";

/// Directory inside the data dir holding cached talent trees.
pub const TALENT_CACHE_DIR_NAME: &str = "talent_tree_cache";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub server_url: String,
    pub auth_key: Option<String>,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    /// Auto-add realm scans and talent tree builds take far longer than a fetch.
    pub scan_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            server_url: DEFAULT_SERVER_URL.to_string(),
            auth_key: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    /// Reads configuration from process environment and arguments.
    pub fn from_env() -> Self {
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        config.with_args(std::env::args().skip(1))
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            data_dir: non_empty("INNKEEPER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            server_url: non_empty("INNKEEPER_SERVER_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.server_url),
            auth_key: non_empty("INNKEEPER_AUTH_KEY"),
            cache_ttl: parse_secs(&non_empty, "INNKEEPER_CACHE_TTL_SECS")
                .unwrap_or(defaults.cache_ttl),
            fetch_timeout: parse_secs(&non_empty, "INNKEEPER_FETCH_TIMEOUT_SECS")
                .filter(|d| !d.is_zero())
                .unwrap_or(defaults.fetch_timeout),
            scan_timeout: parse_secs(&non_empty, "INNKEEPER_SCAN_TIMEOUT_SECS")
                .filter(|d| !d.is_zero())
                .unwrap_or(defaults.scan_timeout),
        }
    }

    /// Applies `--datadir <path>` (or `--datadir=<path>`) from command-line arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            if let Some(path) = arg.strip_prefix("--datadir=") {
                self.data_dir = PathBuf::from(path);
            } else if arg == "--datadir" {
                if let Some(path) = args.next() {
                    self.data_dir = PathBuf::from(path);
                }
            }
        }
        self
    }

    pub fn roster_path(&self) -> PathBuf {
        self.data_dir.join(ROSTER_FILE_NAME)
    }

    pub fn talent_cache_dir(&self) -> PathBuf {
        self.data_dir.join(TALENT_CACHE_DIR_NAME)
    }
}

fn parse_number<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.parse::<usize>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, val = %raw, "Not a valid number, using default");
            None
        }
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_number(lookup, key).map(|secs| Duration::from_secs(secs as u64))
}
