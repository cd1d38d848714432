use crate::config::{ArchiveConfig, Compression};
use crate::error::ArchiveError;
use crate::types::ArchiveEntry;
use async_trait::async_trait;
use std::io::{Cursor, Write};
use tracing::debug;

use super::{ArchivePacker, PackProgressFn};

/// Archive packer producing a flat zip file in memory
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipPacker {
    compression: Compression,
}

impl ZipPacker {
    /// Create a packer using the given compression for every entry
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }

    /// Create a packer from the archive settings
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.compression)
    }

    fn method(&self) -> ::zip::CompressionMethod {
        match self.compression {
            Compression::Deflated => ::zip::CompressionMethod::Deflated,
            Compression::Stored => ::zip::CompressionMethod::Stored,
        }
    }

    /// Build the archive synchronously, calling `progress` after every entry
    fn build(
        entries: &[ArchiveEntry],
        method: ::zip::CompressionMethod,
        mut progress: impl FnMut(f32),
    ) -> Result<Vec<u8>, ArchiveError> {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = ::zip::write::FileOptions::default().compression_method(method);

        for (i, entry) in entries.iter().enumerate() {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| {
                    ArchiveError::Packing(format!("failed to start entry '{}': {}", entry.name, e))
                })?;
            writer.write_all(&entry.data).map_err(|e| {
                ArchiveError::Packing(format!("failed to write entry '{}': {}", entry.name, e))
            })?;
            progress(((i + 1) as f32 / entries.len() as f32) * 100.0);
        }

        if entries.is_empty() {
            progress(100.0);
        }

        let cursor = writer
            .finish()
            .map_err(|e| ArchiveError::Packing(format!("failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl ArchivePacker for ZipPacker {
    async fn pack(
        &self,
        entries: Vec<ArchiveEntry>,
        on_progress: &mut PackProgressFn<'_>,
    ) -> Result<Vec<u8>, ArchiveError> {
        debug!(entries = entries.len(), compression = ?self.compression, "packing zip archive");

        let method = self.method();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = tokio::task::spawn_blocking(move || {
            Self::build(&entries, method, |percent| {
                // Receiver only goes away if the run future was dropped
                let _ = tx.send(percent);
            })
        });

        while let Some(percent) = rx.recv().await {
            on_progress(percent);
        }

        let blob = handle
            .await
            .map_err(|e| ArchiveError::Packing(format!("packing task failed: {}", e)))??;

        debug!(size_bytes = blob.len(), "zip archive built");
        Ok(blob)
    }

    fn name(&self) -> &'static str {
        "zip"
    }
}
