//! Pure projection of a [`RunState`] onto the status surfaces
//!
//! Nothing here mutates state; a front end renders a [`RunView`] after every
//! snapshot it receives from [`BatchDownloader::watch_state`](crate::BatchDownloader::watch_state).

use crate::types::{ItemLabel, RunPhase, RunState};
use serde::Serialize;

/// Status of one resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemView {
    /// Display name
    pub name: String,
    /// Progress in percent (0 to 100)
    pub percent: u8,
    /// Status label
    pub label: ItemLabel,
}

/// Aggregate status of a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OverallView {
    /// Resources that reached a terminal outcome
    pub completed: usize,
    /// Resources in the run
    pub total: usize,
    /// `"completed / total"`
    pub label: String,
    /// `round(completed / total * 100)`, 0 for an empty run
    pub percent: u8,
}

/// Everything a front end needs to draw the current run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunView {
    /// One entry per resource, in list order
    pub items: Vec<ItemView>,
    /// Aggregate status
    pub overall: OverallView,
    /// Most recent notable event
    pub log: Option<String>,
    /// Whether the start trigger should be enabled
    pub trigger_enabled: bool,
}

impl From<&RunState> for RunView {
    fn from(state: &RunState) -> Self {
        let items = state
            .items
            .iter()
            .map(|item| ItemView {
                name: item.descriptor.name.clone(),
                percent: (item.outcome.fraction() * 100.0).round() as u8,
                label: item.outcome.label(),
            })
            .collect();

        let aggregate = state.aggregate;
        Self {
            items,
            overall: OverallView {
                completed: aggregate.completed,
                total: aggregate.total,
                label: format!("{} / {}", aggregate.completed, aggregate.total),
                percent: aggregate.percent(),
            },
            log: state.log.clone(),
            trigger_enabled: state.phase == RunPhase::Idle,
        }
    }
}

impl std::fmt::Display for RunView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for item in &self.items {
            writeln!(f, "{:<40} {:>3}%  {}", item.name, item.percent, item.label)?;
        }
        write!(f, "{} ({}%)", self.overall.label, self.overall.percent)?;
        if let Some(log) = &self.log {
            write!(f, "\n{}", log)?;
        }
        Ok(())
    }
}
