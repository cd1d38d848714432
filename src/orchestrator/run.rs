//! The sequential download loop and the archive step that follows it.

use crate::error::{ArchiveError, Result};
use crate::fetcher::FetchProgress;
use crate::types::{ArchiveEntry, Event, ItemFailure, RunPhase, RunReport, RunState};
use crate::utils::unique_entry_names;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{BatchDownloader, TriggerGuard};

/// State owned by one run from start to finish
pub(super) struct Run<'a> {
    downloader: &'a BatchDownloader,
    state: RunState,
    /// Payloads of succeeded resources, in list order, keyed by display name
    payloads: Vec<(String, Arc<[u8]>)>,
    failures: Vec<ItemFailure>,
    started_at: DateTime<Utc>,
    trigger: Option<TriggerGuard>,
}

impl<'a> Run<'a> {
    pub(super) fn new(downloader: &'a BatchDownloader, trigger: TriggerGuard) -> Self {
        Self {
            downloader,
            state: RunState::new(&downloader.descriptors),
            payloads: Vec::new(),
            failures: Vec::new(),
            started_at: Utc::now(),
            trigger: Some(trigger),
        }
    }

    pub(super) async fn execute(mut self) -> Result<RunReport> {
        let total = self.state.items.len();
        info!(total, "starting download run");

        self.state.phase = RunPhase::Running;
        self.publish();
        self.downloader.emit_event(Event::RunStarted { total });
        self.downloader.emit_event(Event::OverallProgress {
            completed: 0,
            total,
        });

        for index in 0..total {
            self.process_item(index).await;
        }

        self.state.phase = RunPhase::Finalizing;
        self.state.log = Some("Packing archive...".to_string());
        self.publish();

        match self.finalize().await {
            Ok(archive_path) => {
                let archive_name = archive_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.downloader.config.archive_name.clone());
                self.state.log = Some(format!("Done! {} saved.", archive_name));
                self.finish();

                let report = RunReport {
                    archive_path,
                    entries: unique_entry_names(self.payloads.iter().map(|(name, _)| name)),
                    failures: self.failures,
                    total,
                    started_at: self.started_at,
                    finished_at: Utc::now(),
                };

                info!(
                    succeeded = report.succeeded(),
                    failed = report.failures.len(),
                    archive = %report.archive_path.display(),
                    "download run finished"
                );
                self.downloader.emit_event(Event::RunFinished {
                    succeeded: report.succeeded(),
                    failed: report.failures.len(),
                });
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "archive step failed");
                self.state.log = Some(format!("Archive error: {}", e));
                self.finish();
                self.downloader.emit_event(Event::RunFailed {
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Retrieve one resource; failures are recorded, never propagated
    async fn process_item(&mut self, index: usize) {
        let descriptor = self.state.items[index].descriptor.clone();
        let downloader = self.downloader;
        let indeterminate = downloader.config.fetch.indeterminate_progress;

        debug!(index, identifier = %descriptor.identifier, "fetching resource");
        self.state.mark_in_progress(index, 0.0);
        self.publish();
        downloader.emit_event(Event::ItemStarted {
            index,
            name: descriptor.name.clone(),
        });

        let state = &mut self.state;
        let mut on_progress = |progress: FetchProgress| {
            let fraction = state.advance(index, progress.as_fraction(indeterminate));
            downloader.publish(state);
            downloader.emit_event(Event::ItemProgress {
                index,
                percent: (fraction * 100.0) as f32,
            });
        };
        let result = downloader
            .fetcher
            .fetch(&descriptor.identifier, &mut on_progress)
            .await;

        match result {
            Ok(bytes) => {
                let size_bytes = bytes.len() as u64;
                let payload: Arc<[u8]> = bytes.into();
                self.state.mark_succeeded(index, payload.clone());
                self.payloads.push((descriptor.name.clone(), payload));

                debug!(index, name = %descriptor.name, size_bytes, "resource retrieved");
                downloader.emit_event(Event::ItemSucceeded {
                    index,
                    name: descriptor.name.clone(),
                    size_bytes,
                });
            }
            Err(e) => {
                let message = e.to_string();
                warn!(
                    index,
                    identifier = %descriptor.identifier,
                    error = %message,
                    "resource download failed"
                );
                self.state.mark_failed(index, message.clone());
                self.state.log = Some(format!(
                    "Download error: {} - {}",
                    descriptor.name, message
                ));
                self.failures.push(ItemFailure {
                    identifier: descriptor.identifier.clone(),
                    name: descriptor.name.clone(),
                    error: message.clone(),
                });
                downloader.emit_event(Event::ItemFailed {
                    index,
                    name: descriptor.name.clone(),
                    error: message,
                });
            }
        }

        self.state.aggregate.increment();
        self.publish();
        downloader.emit_event(Event::OverallProgress {
            completed: self.state.aggregate.completed,
            total: self.state.aggregate.total,
        });
    }

    /// Pack the succeeded payloads and hand the blob to the sink
    async fn finalize(&mut self) -> std::result::Result<PathBuf, ArchiveError> {
        let names = unique_entry_names(self.payloads.iter().map(|(name, _)| name));
        let entries: Vec<ArchiveEntry> = names
            .into_iter()
            .zip(self.payloads.iter())
            .map(|(name, (_, data))| ArchiveEntry {
                name,
                data: data.clone(),
            })
            .collect();

        debug!(entries = entries.len(), "packing archive");

        let downloader = self.downloader;
        let state = &mut self.state;
        let mut on_progress = |percent: f32| {
            state.log = Some(format!("Packing... {:.0}%", percent));
            downloader.publish(state);
            downloader.emit_event(Event::Packing { percent });
        };
        let blob = downloader.packer.pack(entries, &mut on_progress).await?;

        let path = downloader
            .sink
            .save(&downloader.config.archive_name, blob)
            .await?;
        downloader.emit_event(Event::ArchiveSaved { path: path.clone() });
        Ok(path)
    }

    /// Return to idle and re-enable the trigger
    fn finish(&mut self) {
        self.state.phase = RunPhase::Idle;
        match self.trigger.take() {
            Some(trigger) => trigger.release(&self.state),
            None => self.publish(),
        }
    }

    fn publish(&self) {
        self.downloader.publish(&self.state);
    }
}
