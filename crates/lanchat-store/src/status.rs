//! Message delivery state machine.
//!
//! ```text
//! sending ──► sent ──► read
//!    │  ▲       ▲
//!    ▼  │       │ (late confirmation)
//!   failed ─────┘
//! ```
//!
//! Every status change in the store goes through [`check_transition`].

use lanchat_shared::types::MessageStatus;

/// Verdict for a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Regular forward step.
    Applied,
    /// A confirmation arrived for a message already marked failed (the
    /// backend finished after the local timeout). Applied.
    Reconciled,
    /// Target equals the current status. Nothing to do.
    Unchanged,
    /// Not allowed; the status is left as it was.
    Rejected,
}

impl Transition {
    /// Whether the status actually changes.
    pub fn changes_status(&self) -> bool {
        matches!(self, Transition::Applied | Transition::Reconciled)
    }
}

pub fn check_transition(from: MessageStatus, to: MessageStatus) -> Transition {
    use MessageStatus::*;

    if from == to {
        return Transition::Unchanged;
    }

    match (from, to) {
        (Sending, Sent) | (Sending, Failed) | (Failed, Sending) | (Sent, Read) => {
            Transition::Applied
        }
        (Failed, Sent) => Transition::Reconciled,
        _ => Transition::Rejected,
    }
}
