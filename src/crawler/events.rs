//! Events pushed from a running capture task to its collaborator

use crate::state::ProgressSnapshot;
use tokio::sync::mpsc::UnboundedSender;

/// Event emitted by a capture task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Counters changed after an asset or page completed
    Progress(ProgressSnapshot),

    /// A page was captured and scanned
    PageCaptured { url: String, local_path: String },

    /// The archive was built; this is the final event of a successful task
    Completed(ProgressSnapshot),

    /// The task was cancelled; no archive is produced
    Cancelled(ProgressSnapshot),

    /// The task failed with a terminal error
    Failed {
        message: String,
        snapshot: ProgressSnapshot,
    },
}

impl CaptureEvent {
    /// Returns true for events after which the task emits nothing more
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed(_) | Self::Cancelled(_) | Self::Failed { .. }
        )
    }
}

/// Sending half of a task's event channel
///
/// A disabled sink drops every event. Send errors are ignored; the
/// collaborator may stop listening at any time.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<CaptureEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<CaptureEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Creates a sink that discards all events
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: CaptureEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn progress(&self, snapshot: ProgressSnapshot) {
        self.send(CaptureEvent::Progress(snapshot));
    }
}
