//! Core types for bundle-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::utils::display_name;

/// One addressable resource: a local path or an absolute URL
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// The identifier exactly as configured
    pub identifier: String,
    /// Final path segment of the identifier, used as the archive entry name
    pub name: String,
}

impl ResourceDescriptor {
    /// Create a descriptor, deriving its display name from the identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let name = display_name(&identifier);
        Self { identifier, name }
    }

    /// Build the ordered descriptor list for a set of identifiers
    pub fn from_identifiers<I, S>(identifiers: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        identifiers.into_iter().map(Self::new).collect()
    }
}

/// Phase of the orchestrator's run state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// No run active; the trigger is enabled
    #[default]
    Idle,
    /// Resources are being retrieved one by one
    Running,
    /// Every resource is terminal; the archive is being built and saved
    Finalizing,
}

/// Status label shown next to each resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemLabel {
    /// Not started yet
    Waiting,
    /// Bytes are arriving
    Downloading,
    /// Retrieved successfully
    Done,
    /// Retrieval failed
    Error,
}

impl std::fmt::Display for ItemLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ItemLabel::Waiting => "waiting",
            ItemLabel::Downloading => "downloading",
            ItemLabel::Done => "done",
            ItemLabel::Error => "error",
        };
        f.write_str(label)
    }
}

/// Per-resource outcome of a run
#[derive(Clone, Debug, PartialEq)]
pub enum DownloadOutcome {
    /// Not started yet
    Pending,
    /// Transfer in progress
    InProgress {
        /// Fraction received so far (0.0 to 1.0)
        fraction: f64,
    },
    /// Transfer completed
    Succeeded {
        /// The complete payload
        payload: Arc<[u8]>,
    },
    /// Transfer failed; never retried
    Failed {
        /// Human-readable error description
        error: String,
        /// Progress reached before the failure
        last_fraction: f64,
    },
}

impl DownloadOutcome {
    /// Whether the outcome is final for this run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadOutcome::Succeeded { .. } | DownloadOutcome::Failed { .. }
        )
    }

    /// Progress fraction to display for this outcome
    pub fn fraction(&self) -> f64 {
        match self {
            DownloadOutcome::Pending => 0.0,
            DownloadOutcome::InProgress { fraction } => *fraction,
            DownloadOutcome::Succeeded { .. } => 1.0,
            DownloadOutcome::Failed { last_fraction, .. } => *last_fraction,
        }
    }

    /// Status label for this outcome
    pub fn label(&self) -> ItemLabel {
        match self {
            DownloadOutcome::Pending => ItemLabel::Waiting,
            DownloadOutcome::InProgress { .. } => ItemLabel::Downloading,
            DownloadOutcome::Succeeded { .. } => ItemLabel::Done,
            DownloadOutcome::Failed { .. } => ItemLabel::Error,
        }
    }
}

/// A resource paired with its current outcome
#[derive(Clone, Debug, PartialEq)]
pub struct ItemState {
    /// The resource
    pub descriptor: ResourceDescriptor,
    /// Its outcome in the current run
    pub outcome: DownloadOutcome,
}

/// Completed-versus-total counter for a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAggregate {
    /// Resources that reached a terminal outcome
    pub completed: usize,
    /// Resources in the run
    pub total: usize,
}

impl RunAggregate {
    /// Start a fresh counter
    pub fn new(total: usize) -> Self {
        Self { completed: 0, total }
    }

    /// Count one more terminal resource, never exceeding the total
    pub fn increment(&mut self) {
        if self.completed < self.total {
            self.completed += 1;
        }
    }

    /// Overall percentage, rounded; 0 for an empty run
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Explicit state of one run, published to observers after every change
///
/// Outcomes are stored next to their descriptors, so the outcome count always
/// equals the resource count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunState {
    /// Current phase
    pub phase: RunPhase,
    /// One entry per resource, in list order
    pub items: Vec<ItemState>,
    /// Completed-versus-total counter
    pub aggregate: RunAggregate,
    /// Most recent notable event (failure, packing progress, completion)
    pub log: Option<String>,
}

impl RunState {
    /// Build an idle state with every resource pending
    pub fn new(descriptors: &[ResourceDescriptor]) -> Self {
        Self {
            phase: RunPhase::Idle,
            items: descriptors
                .iter()
                .cloned()
                .map(|descriptor| ItemState {
                    descriptor,
                    outcome: DownloadOutcome::Pending,
                })
                .collect(),
            aggregate: RunAggregate::new(descriptors.len()),
            log: None,
        }
    }

    /// Resources whose outcome is terminal
    pub fn terminal_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome.is_terminal())
            .count()
    }

    pub(crate) fn mark_in_progress(&mut self, index: usize, fraction: f64) {
        if let Some(item) = self.items.get_mut(index) {
            item.outcome = DownloadOutcome::InProgress {
                fraction: fraction.clamp(0.0, 1.0),
            };
        }
    }

    /// Move an in-progress resource forward; lower fractions are ignored.
    /// Returns the fraction now recorded.
    pub(crate) fn advance(&mut self, index: usize, fraction: f64) -> f64 {
        let current = self
            .items
            .get(index)
            .map(|item| item.outcome.fraction())
            .unwrap_or(0.0);
        let next = fraction.clamp(0.0, 1.0).max(current);
        self.mark_in_progress(index, next);
        next
    }

    pub(crate) fn mark_succeeded(&mut self, index: usize, payload: Arc<[u8]>) {
        if let Some(item) = self.items.get_mut(index) {
            item.outcome = DownloadOutcome::Succeeded { payload };
        }
    }

    pub(crate) fn mark_failed(&mut self, index: usize, error: String) {
        if let Some(item) = self.items.get_mut(index) {
            let last_fraction = item.outcome.fraction();
            item.outcome = DownloadOutcome::Failed {
                error,
                last_fraction,
            };
        }
    }
}

/// One named buffer handed to the archive packer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name inside the archive (no directories)
    pub name: String,
    /// Entry content
    pub data: Arc<[u8]>,
}

/// A resource that failed during a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// The resource's identifier
    pub identifier: String,
    /// The resource's display name
    pub name: String,
    /// Error description
    pub error: String,
}

/// Summary of a finished run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// Where the archive was delivered
    pub archive_path: PathBuf,
    /// Entry names written to the archive, in order
    pub entries: Vec<String>,
    /// Resources that failed, in list order
    pub failures: Vec<ItemFailure>,
    /// Resources in the run
    pub total: usize,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the archive was saved
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Number of resources that were retrieved successfully
    pub fn succeeded(&self) -> usize {
        self.entries.len()
    }
}

/// Event emitted during a run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run started
    RunStarted {
        /// Resources in the run
        total: usize,
    },

    /// Retrieval of a resource started
    ItemStarted {
        /// Position in the resource list
        index: usize,
        /// Display name
        name: String,
    },

    /// Progress update for the current resource
    ItemProgress {
        /// Position in the resource list
        index: usize,
        /// Progress percentage (0.0 to 100.0)
        percent: f32,
    },

    /// A resource was retrieved
    ItemSucceeded {
        /// Position in the resource list
        index: usize,
        /// Display name
        name: String,
        /// Payload size
        size_bytes: u64,
    },

    /// A resource failed
    ItemFailed {
        /// Position in the resource list
        index: usize,
        /// Display name
        name: String,
        /// Error description
        error: String,
    },

    /// The aggregate counter advanced
    OverallProgress {
        /// Resources that reached a terminal outcome
        completed: usize,
        /// Resources in the run
        total: usize,
    },

    /// Archive packing progress
    Packing {
        /// Progress percentage (0.0 to 100.0)
        percent: f32,
    },

    /// The archive was delivered
    ArchiveSaved {
        /// Where the archive was written
        path: PathBuf,
    },

    /// The run finished
    RunFinished {
        /// Resources retrieved successfully
        succeeded: usize,
        /// Resources that failed
        failed: usize,
    },

    /// Building or saving the archive failed
    RunFailed {
        /// Error description
        error: String,
    },
}
