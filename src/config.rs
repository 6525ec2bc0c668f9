use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::feed::{ConfigError, FeedConfig, RawFeed};
use crate::wiki::{Catalog, Site};

/// Default feed file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "./rcfeed.json";

/// Process configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Feeds and
/// the site block live in a JSON file pointed to by RCFEED_CONFIG.
#[derive(Debug, Clone)]
pub struct Config {
    /// Feed file (RCFEED_CONFIG).
    pub config_path: PathBuf,
    /// Extra message catalog overlaid on the built-in English one (RCFEED_MESSAGES).
    pub messages_path: Option<PathBuf>,
    /// Overrides the site block's `name` (RCFEED_SITENAME).
    pub site_name: Option<String>,
    /// Overrides the site block's `server` (RCFEED_SERVER).
    pub server: Option<String>,
    /// Connect and total timeout per webhook post (RCFEED_TIMEOUT_SECS).
    pub timeout: Duration,
    /// Webhook posts in flight per event; 1 means sequential (RCFEED_CONCURRENCY).
    pub concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let timeout_secs: u64 = match non_empty("RCFEED_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("RCFEED_TIMEOUT_SECS is not a number: {v}"))?,
            None => 10,
        };
        let concurrency: usize = match non_empty("RCFEED_CONCURRENCY") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("RCFEED_CONCURRENCY is not a number: {v}"))?,
            None => 1,
        };

        Ok(Self {
            config_path: non_empty("RCFEED_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            messages_path: non_empty("RCFEED_MESSAGES").map(PathBuf::from),
            site_name: non_empty("RCFEED_SITENAME"),
            server: non_empty("RCFEED_SERVER"),
            timeout: Duration::from_secs(timeout_secs.max(1)),
            concurrency: concurrency.max(1),
        })
    }

    /// Read the feed file and apply the environment's site overrides.
    pub fn load_feeds(&self) -> Result<FeedSet> {
        let mut set = FeedSet::from_file(&self.config_path)?;
        if let Some(name) = &self.site_name {
            set.site.name = name.clone();
        }
        if let Some(server) = &self.server {
            set.site.server = server.trim_end_matches('/').to_string();
        }
        Ok(set)
    }

    /// Built-in English messages plus the optional override file.
    pub fn load_catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::english();
        if let Some(path) = &self.messages_path {
            let count = catalog.load_overrides(path)?;
            info!(path = %path.display(), messages = count, "Loaded message overrides");
        }
        Ok(catalog)
    }
}

/// The feed file as written.
#[derive(Debug, Default, Deserialize)]
struct FeedFile {
    #[serde(default)]
    site: Site,
    /// Kept loose so one badly typed feed doesn't sink the others.
    #[serde(default)]
    feeds: BTreeMap<String, serde_json::Value>,
}

/// The site and every usable feed.
#[derive(Debug, Default)]
pub struct FeedSet {
    pub site: Site,
    pub feeds: Vec<FeedConfig>,
    /// Feeds dropped for configuration errors, already logged.
    pub rejected: Vec<ConfigError>,
}

impl FeedSet {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feed config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid feed config {}", path.display()))
    }

    /// Parse and normalize a feed file. A broken feed is logged and
    /// dropped; the others still load.
    pub fn parse(json: &str) -> Result<Self> {
        let file: FeedFile = serde_json::from_str(json).context("Failed to parse feed config")?;
        let site = Site {
            server: file.site.server.trim_end_matches('/').to_string(),
            ..file.site
        };

        let mut feeds = Vec::new();
        let mut rejected = Vec::new();
        for (name, value) in file.feeds {
            let parsed = serde_json::from_value::<RawFeed>(value)
                .map_err(|e| ConfigError::Malformed {
                    feed: name.clone(),
                    reason: e.to_string(),
                })
                .and_then(|raw| FeedConfig::from_raw(&name, raw));
            match parsed {
                Ok(feed) => feeds.push(feed),
                Err(e) => {
                    warn!(feed = %name, error = %e, "Skipping feed");
                    rejected.push(e);
                }
            }
        }

        if feeds.is_empty() {
            warn!("No usable feeds configured");
        }
        Ok(Self {
            site,
            feeds,
            rejected,
        })
    }

    pub fn feed(&self, name: &str) -> Option<&FeedConfig> {
        self.feeds.iter().find(|f| f.name == name)
    }
}
