//! Archive packing and delivery
//!
//! Two trait seams sit at the end of a run:
//!
//! - [`ArchivePacker`] turns the named payloads into one compressed blob,
//!   reporting progress while it works. [`ZipPacker`] builds a flat zip.
//! - [`ArchiveSink`] offers the finished blob to the user under a fixed name.
//!   [`FileSink`] writes it into an output directory.
//!
//! ## Usage
//!
//! ```no_run
//! use bundle_dl::archive::{ArchivePacker, ArchiveSink, FileSink, ZipPacker};
//! use bundle_dl::config::{Compression, FileCollisionAction};
//! use bundle_dl::types::ArchiveEntry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let entries = vec![ArchiveEntry {
//!         name: "hello.txt".to_string(),
//!         data: b"hello".as_slice().into(),
//!     }];
//!
//!     let packer = ZipPacker::new(Compression::Deflated);
//!     let blob = packer
//!         .pack(entries, &mut |percent| println!("packing {:.0}%", percent))
//!         .await?;
//!
//!     let sink = FileSink::new("downloads", FileCollisionAction::Rename);
//!     let path = sink.save("files.zip", blob).await?;
//!     println!("saved {}", path.display());
//!     Ok(())
//! }
//! ```

mod sink;
mod zip;


pub use self::zip::ZipPacker;
pub use sink::FileSink;

use crate::error::ArchiveError;
use crate::types::ArchiveEntry;
use async_trait::async_trait;
use std::path::PathBuf;

/// Packing progress callback, receiving a percentage (0.0 to 100.0)
pub type PackProgressFn<'a> = dyn FnMut(f32) + Send + 'a;

/// Trait for bundling named byte buffers into one compressed blob
#[async_trait]
pub trait ArchivePacker: Send + Sync {
    /// Pack `entries` in order, one archive entry each, no directories
    ///
    /// An empty entry list produces a valid, empty archive.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Packing`] when the archive cannot be built.
    async fn pack(
        &self,
        entries: Vec<ArchiveEntry>,
        on_progress: &mut PackProgressFn<'_>,
    ) -> Result<Vec<u8>, ArchiveError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Trait for offering a finished archive to the user as a named download
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Deliver `data` under `name` and return where it ended up
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Save`] when the archive cannot be delivered.
    async fn save(&self, name: &str, data: Vec<u8>) -> Result<PathBuf, ArchiveError>;
}
