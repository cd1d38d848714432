//! Batch download orchestration.
//!
//! [`BatchDownloader`] owns the fixed resource list and the trait objects that
//! do the actual work:
//! - a [`Fetcher`] retrieving one resource at a time
//! - an [`ArchivePacker`] bundling the retrieved payloads
//! - an [`ArchiveSink`] delivering the finished archive
//!
//! A run is driven by [`BatchDownloader::start`]; the loop itself lives in
//! [`run`]. Consumers observe a run through events ([`BatchDownloader::subscribe`])
//! or through snapshots of the explicit run state ([`BatchDownloader::watch_state`]).

mod run;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::archive::{ArchivePacker, ArchiveSink, FileSink, ZipPacker};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::types::{Event, ResourceDescriptor, RunPhase, RunReport, RunState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, watch};

/// Event channel capacity; slow subscribers miss older events
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Downloads a fixed list of resources into one archive (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct BatchDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Resource list, fixed for the lifetime of the downloader
    pub(crate) descriptors: Arc<Vec<ResourceDescriptor>>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) packer: Arc<dyn ArchivePacker>,
    pub(crate) sink: Arc<dyn ArchiveSink>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Latest run state snapshot
    pub(crate) state_tx: Arc<watch::Sender<RunState>>,
    /// Set while a run is active; acts as the disabled trigger
    pub(crate) running: Arc<AtomicBool>,
}

impl BatchDownloader {
    /// Create a downloader with the default HTTP fetcher, zip packer and file sink
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        let packer = Arc::new(ZipPacker::from_config(&config.archive));
        let sink = Arc::new(FileSink::from_config(&config.output));
        Self::with_components(config, fetcher, packer, sink)
    }

    /// Create a downloader with custom collaborators
    pub fn with_components(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        packer: Arc<dyn ArchivePacker>,
        sink: Arc<dyn ArchiveSink>,
    ) -> Result<Self> {
        config.validate()?;

        let descriptors = ResourceDescriptor::from_identifiers(config.resources.iter().cloned());
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, _state_rx) = watch::channel(RunState::new(&descriptors));

        tracing::debug!(
            resources = descriptors.len(),
            fetcher = fetcher.name(),
            packer = packer.name(),
            "batch downloader created"
        );

        Ok(Self {
            config: Arc::new(config),
            descriptors: Arc::new(descriptors),
            fetcher,
            packer,
            sink,
            event_tx,
            state_tx: Arc::new(state_tx),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Run the whole download-then-archive workflow once
    ///
    /// Resources are retrieved one at a time, in list order. Failed resources
    /// are recorded and skipped; the archive is built from whatever succeeded,
    /// even if that is nothing.
    ///
    /// # Errors
    ///
    /// - [`Error::RunInProgress`] if another run is active
    /// - [`Error::Archive`] if the archive cannot be built or saved; the
    ///   downloader returns to idle and can be started again
    pub async fn start(&self) -> Result<RunReport> {
        let trigger = TriggerGuard::acquire(&self.running, &self.state_tx)?;
        run::Run::new(self, trigger).execute().await
    }

    /// Whether a run is active (the trigger is disabled)
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Watch run state snapshots, published after every change
    pub fn watch_state(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    /// Current run state snapshot
    pub fn state(&self) -> RunState {
        self.state_tx.borrow().clone()
    }

    /// The fixed resource list
    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    /// Get the configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    pub(crate) fn publish(&self, state: &RunState) {
        self.state_tx.send_replace(state.clone());
    }
}

/// Holds the trigger disabled for the duration of a run
///
/// The trigger is re-enabled inside the same watch update that publishes the
/// idle state, so no observer sees `Idle` while `is_running()` is still true.
/// Dropping an unreleased guard (error, panic, or a dropped future) does the
/// same with the last published state.
struct TriggerGuard {
    running: Arc<AtomicBool>,
    state_tx: Arc<watch::Sender<RunState>>,
    released: bool,
}

impl TriggerGuard {
    fn acquire(running: &Arc<AtomicBool>, state_tx: &Arc<watch::Sender<RunState>>) -> Result<Self> {
        running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::RunInProgress)?;
        Ok(Self {
            running: running.clone(),
            state_tx: state_tx.clone(),
            released: false,
        })
    }

    /// Publish the final state of a run and re-enable the trigger
    fn release(mut self, final_state: &RunState) {
        let running = &self.running;
        self.state_tx.send_modify(|state| {
            *state = final_state.clone();
            state.phase = RunPhase::Idle;
            running.store(false, Ordering::SeqCst);
        });
        self.released = true;
    }
}

impl Drop for TriggerGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let running = &self.running;
        self.state_tx.send_if_modified(|state| {
            running.store(false, Ordering::SeqCst);
            if state.phase == RunPhase::Idle {
                return false;
            }
            state.phase = RunPhase::Idle;
            true
        });
    }
}
