use std::collections::BTreeMap;

use serde::Serialize;

use super::{PhoneRecord, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Why a source finished without records.
///
/// Kept separate so an unreachable site (likely transient) can be told apart
/// from a reachable site whose markup no longer yields candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// Every acquisition strategy failed for the listing page.
    Unreachable,
    /// The listing page was fetched but no product links matched.
    NoCandidates,
    /// Candidates were found but none of their detail pages produced a record.
    NoRecords,
}

/// Progress of one source within one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressState {
    pub status: ProgressStatus,
    pub percent_complete: u8,
    pub error: Option<String>,
    pub empty_reason: Option<EmptyReason>,
    pub item_count: usize,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            status: ProgressStatus::Pending,
            percent_complete: 0,
            error: None,
            empty_reason: None,
            item_count: 0,
        }
    }
}

impl ProgressState {
    /// Moves the percentage forward; never backwards, never past 100.
    pub fn advance(&mut self, percent: u8) -> u8 {
        self.percent_complete = self.percent_complete.max(percent.min(100));
        self.percent_complete
    }
}

/// Per-source update pushed to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub source: Source,
    pub progress: u8,
    pub status: ProgressStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Started,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackerEvent {
    Progress(ProgressEvent),
    Batch {
        status: BatchStatus,
        message: String,
        total_count: usize,
    },
}

/// Result of a batch (or single-source) update.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    pub total_count: usize,
    pub stored_count: usize,
    pub message: String,
    pub warning: Option<String>,
    pub sources: BTreeMap<Source, ProgressState>,
    #[serde(skip)]
    pub records: Vec<PhoneRecord>,
}

impl BatchOutcome {
    pub fn is_error(&self) -> bool {
        self.status == BatchStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_never_moves_backwards() {
        let mut state = ProgressState::default();
        assert_eq!(state.advance(40), 40);
        assert_eq!(state.advance(10), 40);
        assert_eq!(state.advance(250), 100);
    }
}
