//! Progress-tracking retrieval of a single resource
//!
//! The [`Fetcher`] trait is the seam the orchestrator drives. [`HttpFetcher`]
//! is the default implementation: it streams HTTP(S) responses and local files
//! chunk by chunk and reports progress after every chunk.
//!
//! ## Usage
//!
//! ```no_run
//! use bundle_dl::config::FetchConfig;
//! use bundle_dl::fetcher::{Fetcher, HttpFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpFetcher::new(&FetchConfig::default())?;
//!     let bytes = fetcher
//!         .fetch("https://example.com/report.pdf", &mut |progress| {
//!             println!("{:.0}%", progress.as_fraction(0.5) * 100.0);
//!         })
//!         .await?;
//!     println!("received {} bytes", bytes.len());
//!     Ok(())
//! }
//! ```

mod http;


pub use http::HttpFetcher;

use crate::error::FetchError;
use async_trait::async_trait;

/// Progress of a single retrieval
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FetchProgress {
    /// Fraction of the declared size received so far (0.0 to 1.0)
    Fraction(f64),
    /// A chunk arrived but the total size is unknown
    Indeterminate,
}

impl FetchProgress {
    /// Resolve to a fraction, using `indeterminate` when the total is unknown
    pub fn as_fraction(self, indeterminate: f64) -> f64 {
        match self {
            FetchProgress::Fraction(f) => f,
            FetchProgress::Indeterminate => indeterminate,
        }
    }
}

/// Progress callback handed to [`Fetcher::fetch`]
pub type ProgressFn<'a> = dyn FnMut(FetchProgress) + Send + 'a;

/// Trait for retrieving one resource with incremental progress
///
/// Implementations must report progress that never decreases within one call,
/// must not retry, and must return the chunks concatenated in arrival order.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve `identifier` and return its complete payload
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] when the server answers with a non-success status
    /// - [`FetchError::Network`] when the transfer fails before completion
    /// - [`FetchError::InvalidIdentifier`] when the identifier cannot be resolved
    async fn fetch(
        &self,
        identifier: &str,
        on_progress: &mut ProgressFn<'_>,
    ) -> Result<Vec<u8>, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Upper bound on the buffer reserved up front from a declared size
const MAX_PREALLOCATION: u64 = 1024 * 1024;

/// Collects chunks in arrival order and computes progress after each one
#[derive(Debug)]
pub(crate) struct ChunkAccumulator {
    total: Option<u64>,
    received: u64,
    buffer: Vec<u8>,
    last: Option<FetchProgress>,
}

impl ChunkAccumulator {
    /// A declared size of zero is treated as unknown. The declared size only
    /// sizes the initial buffer up to [`MAX_PREALLOCATION`]; beyond that the
    /// buffer grows with the bytes actually received.
    pub(crate) fn new(total: Option<u64>) -> Self {
        let total = total.filter(|&t| t > 0);
        let capacity = total.map(|t| t.min(MAX_PREALLOCATION) as usize).unwrap_or(0);
        Self {
            total,
            received: 0,
            buffer: Vec::with_capacity(capacity),
            last: None,
        }
    }

    /// Append a chunk and return the progress to report for it
    pub(crate) fn push(&mut self, chunk: &[u8]) -> FetchProgress {
        self.buffer.extend_from_slice(chunk);
        self.received += chunk.len() as u64;
        let progress = match self.total {
            Some(total) => FetchProgress::Fraction((self.received as f64 / total as f64).min(1.0)),
            None => FetchProgress::Indeterminate,
        };
        self.last = Some(progress);
        progress
    }

    /// Bytes received so far
    pub(crate) fn received(&self) -> u64 {
        self.received
    }

    /// Finish the transfer
    ///
    /// Returns the payload and, when the last reported progress was below
    /// 100%, the final progress update that completes it.
    pub(crate) fn finish(self) -> (Vec<u8>, Option<FetchProgress>) {
        let completion = match self.last {
            Some(FetchProgress::Fraction(f)) if f >= 1.0 => None,
            _ => Some(FetchProgress::Fraction(1.0)),
        };
        (self.buffer, completion)
    }
}
