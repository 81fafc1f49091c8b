//! Optimistic vote arithmetic and the per-action state machine.

use crate::models::{VoteRequest, VoteState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    fn as_state(self) -> VoteState {
        match self {
            VoteDirection::Up => VoteState::Up,
            VoteDirection::Down => VoteState::Down,
        }
    }

    fn sign(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// What the dialog shows for the viewer's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteSnapshot {
    pub vote: VoteState,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub next: VoteSnapshot,
    /// Body of the vote mutation for this click.
    pub request: VoteRequest,
}

/// Applies one click to the current vote.
///
/// Clicking the active direction undoes it, clicking with no vote sets it, and clicking the
/// opposite direction flips it (a swing of two).
pub fn reconcile(current: VoteSnapshot, direction: VoteDirection) -> VoteOutcome {
    let wanted = direction.as_state();
    let (vote, delta) = if current.vote == wanted {
        (VoteState::None, -direction.sign())
    } else if current.vote == VoteState::None {
        (wanted, direction.sign())
    } else {
        (wanted, 2 * direction.sign())
    };

    VoteOutcome {
        next: VoteSnapshot {
            vote,
            count: current.count + delta,
        },
        request: VoteRequest {
            upvote: direction == VoteDirection::Up,
            clicked: current.vote != wanted,
        },
    }
}

/// Lifecycle of a single vote action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VotePhase {
    #[default]
    Idle,
    /// Optimistic state is showing; holds what to restore on failure.
    Pending(VoteSnapshot),
    Committed,
    RolledBack(VoteSnapshot),
}

impl VotePhase {
    pub fn is_pending(&self) -> bool {
        matches!(self, VotePhase::Pending(_))
    }
}
