//! # bundle-dl
//!
//! Download a fixed list of resources one after another and bundle whatever
//! arrived into a single zip archive.
//!
//! ## Design Philosophy
//!
//! bundle-dl is designed to be:
//! - **Failure tolerant** - A resource that cannot be retrieved is recorded and skipped
//! - **Observable** - Per-resource and aggregate progress are published as they change
//! - **Library-first** - Fetching, packing and delivery sit behind traits
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use bundle_dl::{BatchDownloader, Config};
//! use bundle_dl::view::RunView;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         resources: vec![
//!             "./files/file1.txt".to_string(),
//!             "https://example.com/photo.jpg".to_string(),
//!         ],
//!         archive_name: "files.zip".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let downloader = BatchDownloader::new(config)?;
//!
//!     // Render every state snapshot
//!     let mut states = downloader.watch_state();
//!     tokio::spawn(async move {
//!         while states.changed().await.is_ok() {
//!             println!("{}", RunView::from(&*states.borrow_and_update()));
//!         }
//!     });
//!
//!     let report = downloader.start().await?;
//!     println!("saved {}", report.archive_path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Archive packing and delivery
pub mod archive;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Single-resource retrieval with progress
pub mod fetcher;
/// Batch orchestration
pub mod orchestrator;
/// Core types (run state, outcomes, events)
pub mod types;
/// Naming helpers
pub mod utils;
/// Status projection for front ends
pub mod view;

// Re-export commonly used types
pub use archive::{ArchivePacker, ArchiveSink, FileSink, ZipPacker};
pub use config::{
    ArchiveConfig, Compression, Config, FetchConfig, FileCollisionAction, OutputConfig,
};
pub use error::{ArchiveError, Error, FetchError, Result};
pub use fetcher::{FetchProgress, Fetcher, HttpFetcher};
pub use orchestrator::BatchDownloader;
pub use types::{
    ArchiveEntry, DownloadOutcome, Event, ItemFailure, ItemLabel, ItemState, ResourceDescriptor,
    RunAggregate, RunPhase, RunReport, RunState,
};
pub use view::RunView;
