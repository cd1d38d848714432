//! Configuration types for bundle-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How resources are retrieved
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL that relative identifiers are resolved against
    ///
    /// When unset, relative identifiers are read from [`local_root`](Self::local_root).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Directory that relative identifiers are read from when no base URL is set
    /// (default: ".")
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every HTTP request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Read size for local files, in bytes (default: 64 KiB)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Progress fraction shown while the total size is unknown (default: 0.5)
    #[serde(default = "default_indeterminate_progress")]
    pub indeterminate_progress: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            local_root: default_local_root(),
            timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
            chunk_size: default_chunk_size(),
            indeterminate_progress: default_indeterminate_progress(),
        }
    }
}

/// Compression applied to archive entries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// DEFLATE compression (default)
    #[default]
    Deflated,
    /// No compression
    Stored,
}

/// How the archive is built
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Compression method for every entry
    #[serde(default)]
    pub compression: Compression,
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
}

/// Where the finished archive is delivered
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the archive is written to (default: "downloads")
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// What to do when a file with the archive name already exists
    #[serde(default)]
    pub collision: FileCollisionAction,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            collision: FileCollisionAction::default(),
        }
    }
}

/// Main configuration for [`BatchDownloader`](crate::BatchDownloader)
///
/// The resource list is fixed for the lifetime of a downloader; every run
/// processes the same identifiers in the same order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Ordered list of local paths and/or absolute URLs
    #[serde(default)]
    pub resources: Vec<String>,

    /// Name the archive is offered under (default: "files.zip")
    #[serde(default = "default_archive_name")]
    pub archive_name: String,

    /// Retrieval settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Archive building settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Archive delivery settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
            archive_name: default_archive_name(),
            fetch: FetchConfig::default(),
            archive: ArchiveConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON text and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Check settings that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.archive_name.trim().is_empty() {
            return Err(Error::config("archive_name", "archive name must not be empty"));
        }
        if self.archive_name.contains(['/', '\\']) {
            return Err(Error::config(
                "archive_name",
                format!(
                    "archive name '{}' must not contain path separators",
                    self.archive_name
                ),
            ));
        }
        if self.fetch.chunk_size == 0 {
            return Err(Error::config("fetch.chunk_size", "chunk size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.fetch.indeterminate_progress) {
            return Err(Error::config(
                "fetch.indeterminate_progress",
                format!(
                    "indeterminate progress {} is outside 0.0..=1.0",
                    self.fetch.indeterminate_progress
                ),
            ));
        }
        if let Some(base) = &self.fetch.base_url {
            let parsed = url::Url::parse(base).map_err(|e| {
                Error::config("fetch.base_url", format!("invalid base URL '{}': {}", base, e))
            })?;
            if parsed.cannot_be_a_base() {
                return Err(Error::config(
                    "fetch.base_url",
                    format!("'{}' cannot be used as a base URL", base),
                ));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_local_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("bundle-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_indeterminate_progress() -> f64 {
    0.5
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_archive_name() -> String {
    "files.zip".to_string()
}

// Duration serialization helper (as whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
