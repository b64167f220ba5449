//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration pointing at the public indexer and profile APIs.
//!
//! ```toml
//! [indexer]
//! url = "https://hypergoat-app-production.up.railway.app/graphql"
//! page_size = 100
//! max_pages = 5
//!
//! [profiles]
//! url = "https://public.api.bsky.app"
//! concurrency = 5
//!
//! [http]
//! timeout_secs = 30
//!
//! [publish]
//! pds_url = "https://bsky.social"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default Hypergoat GraphQL indexer endpoint.
pub const DEFAULT_INDEXER_URL: &str = "https://hypergoat-app-production.up.railway.app/graphql";

/// Default public profile API endpoint.
pub const DEFAULT_PROFILE_API_URL: &str = "https://public.api.bsky.app";

/// Default personal data server used by the write path.
pub const DEFAULT_PDS_URL: &str = "https://bsky.social";

/// Lexicon of beads review comments.
pub const COMMENT_COLLECTION: &str = "org.impactindexer.review.comment";

/// Lexicon of beads review likes.
pub const LIKE_COLLECTION: &str = "org.impactindexer.review.like";

/// Top-level configuration; one field per TOML section.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

/// `[indexer]`: where and how records are fetched.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexerConfig {
    #[serde(default = "default_indexer_url")]
    pub url: String,
    #[serde(default = "default_comment_collection")]
    pub comment_collection: String,
    #[serde(default = "default_like_collection")]
    pub like_collection: String,
    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Hard cap on pages fetched per collection. Larger result sets are
    /// truncated silently.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            url: default_indexer_url(),
            comment_collection: default_comment_collection(),
            like_collection: default_like_collection(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_indexer_url() -> String {
    DEFAULT_INDEXER_URL.to_string()
}
fn default_comment_collection() -> String {
    COMMENT_COLLECTION.to_string()
}
fn default_like_collection() -> String {
    LIKE_COLLECTION.to_string()
}
fn default_page_size() -> usize {
    100
}
fn default_max_pages() -> usize {
    5
}

/// `[profiles]`: the public profile API.
#[derive(Debug, Deserialize, Clone)]
pub struct ProfilesConfig {
    #[serde(default = "default_profile_url")]
    pub url: String,
    /// Maximum number of profile lookups in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            url: default_profile_url(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_profile_url() -> String {
    DEFAULT_PROFILE_API_URL.to_string()
}
fn default_concurrency() -> usize {
    5
}

/// `[http]`: settings of the shared HTTP client.
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Per-request deadline.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl HttpConfig {
    /// Build the HTTP client shared by every outbound call of one invocation.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")
    }
}

/// `[publish]`: the personal data server new comments are written to.
#[derive(Debug, Deserialize, Clone)]
pub struct PublishConfig {
    #[serde(default = "default_pds_url")]
    pub pds_url: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            pds_url: default_pds_url(),
        }
    }
}

fn default_pds_url() -> String {
    DEFAULT_PDS_URL.to_string()
}

/// Read, parse and validate the TOML file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the config at `path`, or fall back to defaults when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

/// Reject values the pipeline cannot run with: empty indexer URL, zero
/// page size, page cap, concurrency or timeout.
pub fn validate(config: &Config) -> Result<()> {
    if config.indexer.url.trim().is_empty() {
        anyhow::bail!("indexer.url must not be empty");
    }
    if config.indexer.page_size == 0 {
        anyhow::bail!("indexer.page_size must be > 0");
    }
    if config.indexer.max_pages == 0 {
        anyhow::bail!("indexer.max_pages must be > 0");
    }
    if config.profiles.concurrency == 0 {
        anyhow::bail!("profiles.concurrency must be > 0");
    }
    if config.http.timeout_secs == 0 {
        anyhow::bail!("http.timeout_secs must be > 0");
    }
    Ok(())
}
