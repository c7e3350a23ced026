//! Configuration for repoview.
//!
//! Loaded from a TOML file; every field has a default so an empty file (or no
//! file at all) is a valid configuration.
//!
//! ```toml
//! [repositories]
//! paths = ["/srv/git/project.git"]
//! scan_dirs = ["/srv/git"]
//!
//! [log]
//! default_max_count = 10
//!
//! [graph]
//! max_commits = 650
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repositories: RepositoriesConfig,
    pub log: LogConfig,
    pub graph: GraphConfig,
}

/// Which repositories to serve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoriesConfig {
    /// repositories listed one by one; each must open
    pub paths: Vec<PathBuf>,
    /// directories whose immediate children are scanned for repositories
    pub scan_dirs: Vec<PathBuf>,
}

/// Commit listing defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub default_max_count: i64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { default_max_count: 10 }
    }
}

/// Graph view limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// upper bound on commits walked for one graph; `None` disables the cap
    pub max_commits: Option<usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { max_commits: Some(650) }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `path` when given, otherwise `./repoview.toml` if it exists,
    /// otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(Self::DEFAULT_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// file looked up in the working directory when no path is given
    pub const DEFAULT_FILE: &'static str = "repoview.toml";

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.log.default_max_count < 0 {
            return Err(ConfigError::Invalid(
                "log.default_max_count cannot be less than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// add a repository path (builder style, mostly for embedding and tests)
    pub fn with_repository(mut self, path: impl Into<PathBuf>) -> Self {
        self.repositories.paths.push(path.into());
        self
    }

    /// add a directory to scan for repositories
    pub fn with_scan_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.repositories.scan_dirs.push(path.into());
        self
    }

    /// set or clear the graph commit cap
    pub fn with_graph_limit(mut self, limit: Option<usize>) -> Self {
        self.graph.max_commits = limit;
        self
    }
}
