//! Progress reporting for per-source scraping runs.
//!
//! A [`ProgressReporter`] is created per source and run. It owns that
//! source's [`ProgressState`], turns `(current, total)` calls into monotonic
//! percentages and forwards every change to a shared [`ProgressSink`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{
    EmptyReason, ProgressEvent, ProgressState, ProgressStatus, Source, TrackerEvent,
};
use crate::traits::ProgressSink;

/// Forwards events into an unbounded channel; a dropped receiver is ignored.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TrackerEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TrackerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn publish(&self, event: TrackerEvent) {
        if self.tx.send(event).is_err() {
            debug!("Progress receiver dropped, event discarded");
        }
    }
}

/// Writes events to the log.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn publish(&self, event: TrackerEvent) {
        match event {
            TrackerEvent::Progress(ProgressEvent {
                source,
                progress,
                error: Some(error),
                ..
            }) => warn!("[{}] {}% - {}", source, progress, error),
            TrackerEvent::Progress(event) => info!(
                "[{}] {}% {:?}{}",
                event.source,
                event.progress,
                event.status,
                event.message.map(|m| format!(" - {m}")).unwrap_or_default()
            ),
            TrackerEvent::Batch {
                status,
                message,
                total_count,
            } => info!("Batch {:?}: {} ({} phones)", status, message, total_count),
        }
    }
}

pub struct ProgressReporter {
    source: Source,
    state: ProgressState,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl ProgressReporter {
    pub fn new(source: Source, sink: Arc<dyn ProgressSink>, cancel: CancellationToken) -> Self {
        Self {
            source,
            state: ProgressState::default(),
            sink,
            cancel,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn into_state(self) -> ProgressState {
        self.state
    }

    /// Cooperative cancellation checkpoint.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn start(&mut self) {
        self.state.status = ProgressStatus::InProgress;
        self.emit(None, None);
    }

    /// Reports `current` out of `total`. An `error` here describes a skipped
    /// step and travels with this event only.
    pub fn report(
        &mut self,
        current: usize,
        total: usize,
        error: Option<String>,
        message: Option<String>,
    ) {
        let percent = if total == 0 {
            100
        } else {
            (current.min(total) * 100 / total) as u8
        };
        self.state.advance(percent);
        if self.state.status == ProgressStatus::Pending {
            self.state.status = ProgressStatus::InProgress;
        }
        self.emit(error, message);
    }

    /// Records that the run ended without records, and why.
    pub fn mark_empty(&mut self, reason: EmptyReason, error: String) {
        self.state.advance(100);
        self.state.empty_reason = Some(reason);
        self.state.error = Some(error.clone());
        self.emit(Some(error), None);
    }

    pub fn complete(&mut self, item_count: usize) {
        self.state.status = ProgressStatus::Completed;
        self.state.item_count = item_count;
        self.state.advance(100);

        if item_count == 0 && self.state.error.is_none() {
            self.state.empty_reason = Some(EmptyReason::NoRecords);
            self.state.error = Some(format!("No phone data could be collected from {}", self.source));
        }

        let message = format!("{item_count} phones collected");
        self.emit(self.state.error.clone(), Some(message));
    }

    pub fn fail(&mut self, error: String) {
        self.state.status = ProgressStatus::Failed;
        self.state.error = Some(error.clone());
        self.emit(Some(error), None);
    }

    fn emit(&self, error: Option<String>, message: Option<String>) {
        self.sink.publish(TrackerEvent::Progress(ProgressEvent {
            source: self.source,
            progress: self.state.percent_complete,
            status: self.state.status,
            error,
            message,
        }));
    }
}
