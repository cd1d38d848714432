use crate::config::{FileCollisionAction, OutputConfig};
use crate::error::ArchiveError;
use crate::utils::get_unique_path;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use super::ArchiveSink;

/// Sink that writes the archive into a directory
#[derive(Clone, Debug)]
pub struct FileSink {
    dir: PathBuf,
    collision: FileCollisionAction,
}

impl FileSink {
    /// Create a sink writing into `dir`
    pub fn new(dir: impl Into<PathBuf>, collision: FileCollisionAction) -> Self {
        Self {
            dir: dir.into(),
            collision,
        }
    }

    /// Create a sink from the output settings
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.dir.clone(), config.collision)
    }

    /// Directory archives are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArchiveSink for FileSink {
    async fn save(&self, name: &str, data: Vec<u8>) -> Result<PathBuf, ArchiveError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ArchiveError::Save {
                path: self.dir.clone(),
                reason: format!("failed to create output directory: {}", e),
            })?;

        let path = get_unique_path(&self.dir.join(name), self.collision)?;

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| ArchiveError::Save {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        info!(path = %path.display(), size_bytes = data.len(), "archive saved");
        Ok(path)
    }
}
