//! Shared test helpers: scripted collaborators for driving runs without a network.

use crate::archive::{ArchivePacker, ArchiveSink, PackProgressFn, ZipPacker};
use crate::config::Config;
use crate::error::{ArchiveError, FetchError};
use crate::fetcher::{ChunkAccumulator, Fetcher, ProgressFn};
use crate::orchestrator::BatchDownloader;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// What a scripted resource does when fetched
#[derive(Clone, Debug)]
pub(crate) enum Script {
    /// Deliver these chunks; `sized` controls whether the total is declared
    Body { chunks: Vec<Vec<u8>>, sized: bool },
    /// Deliver some chunks, then fail
    FailAfter {
        chunks: Vec<Vec<u8>>,
        error: FetchError,
    },
    /// Fail before any byte arrives
    Fail(FetchError),
    /// Block until released, then deliver `b"gated"`
    Gate(Arc<Notify>),
}

impl Script {
    /// A sized body of `len` bytes delivered in `parts` chunks
    pub(crate) fn sized(len: usize, parts: usize) -> Self {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let chunk_len = len.div_ceil(parts.max(1)).max(1);
        Script::Body {
            chunks: data.chunks(chunk_len).map(|c| c.to_vec()).collect(),
            sized: true,
        }
    }

    /// The bytes a successful fetch of this script yields
    pub(crate) fn payload(&self) -> Vec<u8> {
        match self {
            Script::Body { chunks, .. } => chunks.concat(),
            _ => Vec::new(),
        }
    }
}

/// Fetcher answering from a fixed table of scripts, recording call order
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub(crate) fn new<I, S>(scripts: I) -> Self
    where
        I: IntoIterator<Item = (S, Script)>,
        S: Into<String>,
    {
        Self {
            scripts: scripts.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        identifier: &str,
        on_progress: &mut ProgressFn<'_>,
    ) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(identifier.to_string());
        let script = self
            .scripts
            .get(identifier)
            .cloned()
            .unwrap_or(Script::Fail(FetchError::Http { status: 404 }));

        match script {
            Script::Body { chunks, sized } => {
                let total = sized.then(|| chunks.iter().map(|c| c.len() as u64).sum());
                let mut acc = ChunkAccumulator::new(total);
                for chunk in &chunks {
                    on_progress(acc.push(chunk));
                    tokio::task::yield_now().await;
                }
                let (payload, completion) = acc.finish();
                if let Some(p) = completion {
                    on_progress(p);
                }
                Ok(payload)
            }
            Script::FailAfter { chunks, error } => {
                let total = chunks.iter().map(|c| c.len() as u64).sum::<u64>() * 2;
                let mut acc = ChunkAccumulator::new(Some(total));
                for chunk in &chunks {
                    on_progress(acc.push(chunk));
                }
                Err(error)
            }
            Script::Fail(error) => Err(error),
            Script::Gate(release) => {
                release.notified().await;
                on_progress(crate::fetcher::FetchProgress::Fraction(1.0));
                Ok(b"gated".to_vec())
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Fetcher that blocks every call until released
#[derive(Default)]
pub(crate) struct GatedFetcher {
    pub(crate) release: Arc<Notify>,
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(
        &self,
        _identifier: &str,
        on_progress: &mut ProgressFn<'_>,
    ) -> Result<Vec<u8>, FetchError> {
        self.release.notified().await;
        on_progress(crate::fetcher::FetchProgress::Fraction(1.0));
        Ok(b"gated".to_vec())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Sink keeping saved archives in memory
#[derive(Default)]
pub(crate) struct MemorySink {
    pub(crate) saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    /// The most recently saved archive
    pub(crate) fn last(&self) -> (String, Vec<u8>) {
        self.saved.lock().unwrap().last().cloned().unwrap()
    }

    pub(crate) fn count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl ArchiveSink for MemorySink {
    async fn save(&self, name: &str, data: Vec<u8>) -> Result<PathBuf, ArchiveError> {
        self.saved.lock().unwrap().push((name.to_string(), data));
        Ok(PathBuf::from("memory").join(name))
    }
}

/// Sink that always fails
pub(crate) struct FailingSink;

#[async_trait]
impl ArchiveSink for FailingSink {
    async fn save(&self, name: &str, _data: Vec<u8>) -> Result<PathBuf, ArchiveError> {
        Err(ArchiveError::Save {
            path: PathBuf::from(name),
            reason: "disk full".to_string(),
        })
    }
}

/// Packer that always fails
pub(crate) struct FailingPacker;

#[async_trait]
impl ArchivePacker for FailingPacker {
    async fn pack(
        &self,
        _entries: Vec<crate::types::ArchiveEntry>,
        _on_progress: &mut PackProgressFn<'_>,
    ) -> Result<Vec<u8>, ArchiveError> {
        Err(ArchiveError::Packing("compressor crashed".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Config listing `resources` with defaults everywhere else
pub(crate) fn test_config(resources: &[&str]) -> Config {
    Config {
        resources: resources.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// Downloader with the real zip packer and an in-memory sink
pub(crate) fn create_test_downloader(
    resources: &[&str],
    fetcher: Arc<dyn Fetcher>,
) -> (BatchDownloader, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let downloader = BatchDownloader::with_components(
        test_config(resources),
        fetcher,
        Arc::new(ZipPacker::default()),
        sink.clone(),
    )
    .unwrap();
    (downloader, sink)
}

/// Read every entry of a zip blob as (name, content), in archive order
pub(crate) fn zip_entries(blob: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ::zip::ZipArchive::new(Cursor::new(blob)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}
