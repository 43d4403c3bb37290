//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client behavior shared by both sources
    #[serde(default)]
    pub http: HttpConfig,

    /// GitHub repository search settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Stack Overflow scraping settings
    #[serde(default)]
    pub stackoverflow: StackOverflowConfig,

    /// WebHDFS endpoint
    #[serde(default)]
    pub hdfs: HdfsConfig,

    /// Data lake partitioning
    #[serde(default)]
    pub lake: LakeConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.github.page_size == 0 || self.github.page_size > 100 {
            return Err(AppError::validation(
                "github.page_size must be between 1 and 100",
            ));
        }
        if self.github.max_pages == 0 {
            return Err(AppError::validation("github.max_pages must be > 0"));
        }
        if self.stackoverflow.max_pages == Some(0) {
            return Err(AppError::validation("stackoverflow.max_pages must be > 0"));
        }
        if self.lake.zone.trim().is_empty() || self.lake.zone.contains('/') {
            return Err(AppError::validation(
                "lake.zone must be a single non-empty path segment",
            ));
        }
        url::Url::parse(&self.github.api_url)?;
        url::Url::parse(&self.stackoverflow.site_url)?;
        url::Url::parse(&self.hdfs.url)?;
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// GitHub REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API root, e.g. `https://api.github.com`
    #[serde(default = "defaults::github_api_url")]
    pub api_url: String,

    /// Basic-auth user name (overridden by `GITHUB_USERNAME`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Personal access token (overridden by `GITHUB_TOKEN`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Items per page requested from the search endpoint
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Page ceiling per search; the search API stops serving results past 1000 items
    #[serde(default = "defaults::github_max_pages")]
    pub max_pages: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::github_api_url(),
            username: None,
            token: None,
            page_size: defaults::page_size(),
            max_pages: defaults::github_max_pages(),
        }
    }
}

/// Stack Overflow site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackOverflowConfig {
    /// Site root used for requests and to absolutize permalinks
    #[serde(default = "defaults::stackoverflow_site_url")]
    pub site_url: String,

    /// Listing tab (`newest`, `active`, ...)
    #[serde(default = "defaults::stackoverflow_tab")]
    pub tab: String,

    /// Optional page ceiling; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl Default for StackOverflowConfig {
    fn default() -> Self {
        Self {
            site_url: defaults::stackoverflow_site_url(),
            tab: defaults::stackoverflow_tab(),
            max_pages: None,
        }
    }
}

/// WebHDFS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HdfsConfig {
    /// NameNode HTTP address
    #[serde(default = "defaults::hdfs_url")]
    pub url: String,

    /// Value for the `user.name` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Default for HdfsConfig {
    fn default() -> Self {
        Self {
            url: defaults::hdfs_url(),
            user: None,
        }
    }
}

/// Partitioning settings for the data lake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LakeConfig {
    /// Zone (data-quality tier) written by this exporter
    #[serde(default = "defaults::zone")]
    pub zone: String,
}

impl Default for LakeConfig {
    fn default() -> Self {
        Self {
            zone: defaults::zone(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; datalake-exporter/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    pub fn github_api_url() -> String {
        "https://api.github.com".into()
    }
    pub fn page_size() -> u32 {
        100
    }
    pub fn github_max_pages() -> u32 {
        10
    }

    pub fn stackoverflow_site_url() -> String {
        "https://stackoverflow.com".into()
    }
    pub fn stackoverflow_tab() -> String {
        "newest".into()
    }

    pub fn hdfs_url() -> String {
        "http://hadoop:9870".into()
    }

    pub fn zone() -> String {
        "raw".into()
    }
}
