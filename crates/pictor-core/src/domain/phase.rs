//! Fetch state machine (one instance per fetch call).

use std::fmt;

/// Phase of a single fetch call.
///
/// State transitions:
/// - Idle -> Resolving -> Downloading -> Completed
/// - Idle -> Resolving -> Failed (backend signing failed)
/// - Idle -> Resolving -> Downloading -> Failed (download failed)
///
/// Nothing re-enters `Resolving` or `Downloading`, and nothing is shared across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchPhase {
    /// Created, nothing started yet.
    Idle,

    /// Waiting for the reference to become a fetchable URL.
    Resolving,

    /// Waiting for the downloader's completion.
    Downloading,

    /// Data delivered to the caller.
    Completed,

    /// First error delivered to the caller.
    Failed,
}

impl FetchPhase {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, FetchPhase::Completed | FetchPhase::Failed)
    }

    /// Is `self -> next` a legal transition?
    pub fn can_transition_to(self, next: FetchPhase) -> bool {
        use FetchPhase::*;
        matches!(
            (self, next),
            (Idle, Resolving)
                | (Resolving, Downloading)
                | (Resolving, Failed)
                | (Downloading, Completed)
                | (Downloading, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FetchPhase::Idle => "idle",
            FetchPhase::Resolving => "resolving",
            FetchPhase::Downloading => "downloading",
            FetchPhase::Completed => "completed",
            FetchPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
