//! Configuration loading and validation.
//!
//! Two layers:
//! - [`AppConfig`]: where things live and how to reach the feed (TOML plus
//!   `STREAM_CMS__*` environment overrides).
//! - [`SiteConfig`]: the operator's `config.json` edited through the admin
//!   panel (site settings, theme, priorities, content pages).

mod priorities;
mod site;

pub use priorities::*;
pub use site::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to load config: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid site config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Environment prefix for overrides, e.g. `STREAM_CMS__FEED__URL`.
pub const ENV_PREFIX: &str = "STREAM_CMS";

/// Feed endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Hard timeout for the single feed request
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_feed_url() -> String {
    "https://vercelapi-olive.vercel.app/api/sync-nodes?country=us".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("stream-cms/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn parsed_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::ValidationError(format!("Invalid feed URL: {}", e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::ValidationError(format!(
                "Feed URL must be http(s), got {}",
                other
            ))),
        }
    }
}

/// Admin server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Git publishing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Paths kept out of the published repository
    #[serde(default = "default_local_only")]
    pub local_only: Vec<String>,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_commit_message() -> String {
    "CMS Update: Content Sync".to_string()
}

fn default_local_only() -> Vec<String> {
    ["admin", "server", "core", "_debug", "stream-cms.toml"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branch: default_branch(),
            commit_message: default_commit_message(),
            local_only: default_local_only(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the generated site (and of the git checkout)
    #[serde(default = "default_site_dir")]
    pub site_dir: PathBuf,

    /// Site config JSON, relative to `site_dir`
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,

    /// HTML template, relative to `site_dir`
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    /// Debug artifacts, relative to `site_dir`
    #[serde(default = "default_debug_dir")]
    pub debug_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

fn default_site_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_config_path() -> PathBuf {
    PathBuf::from("data/config.json")
}

fn default_template_path() -> PathBuf {
    PathBuf::from("assets/master_template.html")
}

fn default_debug_dir() -> PathBuf {
    PathBuf::from("_debug")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_dir: default_site_dir(),
            config_path: default_config_path(),
            template_path: default_template_path(),
            debug_dir: default_debug_dir(),
            log_level: default_log_level(),
            feed: FeedConfig::default(),
            server: ServerConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    /// A missing file is not an error; defaults fill the gaps.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Feed timeout must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        self.feed.parsed_url()?;
        Ok(())
    }

    pub fn site_config_path(&self) -> PathBuf {
        self.site_dir.join(&self.config_path)
    }

    pub fn template_file(&self) -> PathBuf {
        self.site_dir.join(&self.template_path)
    }

    pub fn debug_path(&self) -> PathBuf {
        self.site_dir.join(&self.debug_dir)
    }

    /// Point every relative path at a different site root.
    pub fn with_site_dir(mut self, site_dir: impl Into<PathBuf>) -> Self {
        self.site_dir = site_dir.into();
        self
    }

    /// Apply command-line listen overrides and re-check the result.
    pub fn with_listen_addr(
        mut self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.site_dir, PathBuf::from("."));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.feed.timeout_seconds, 10);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.publish.branch, "main");
    }

    #[test]
    fn test_paths_resolve_under_site_dir() {
        let config = AppConfig::default().with_site_dir("/srv/site");

        assert_eq!(
            config.site_config_path(),
            PathBuf::from("/srv/site/data/config.json")
        );
        assert_eq!(
            config.template_file(),
            PathBuf::from("/srv/site/assets/master_template.html")
        );
        assert_eq!(config.debug_path(), PathBuf::from("/srv/site/_debug"));
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.feed.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_feed_url() {
        let mut config = AppConfig::default();
        config.feed.url = "ftp://example.com/feed".to_string();
        assert!(config.validate().is_err());

        config.feed.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream-cms.toml");
        std::fs::write(
            &path,
            r#"
site_dir = "/var/www/site"

[feed]
url = "https://feed.example.com/matches"
timeout_seconds = 5
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.site_dir, PathBuf::from("/var/www/site"));
        assert_eq!(config.feed.url, "https://feed.example.com/matches");
        assert_eq!(config.feed.timeout_seconds, 5);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_listen_overrides_are_validated() {
        let config = AppConfig::default()
            .with_listen_addr(Some("0.0.0.0".to_string()), Some(9090))
            .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);

        let result = AppConfig::default().with_listen_addr(None, Some(0));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.config_path, PathBuf::from("data/config.json"));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.site_dir, parsed.site_dir);
        assert_eq!(config.publish.local_only, parsed.publish.local_only);
    }
}
