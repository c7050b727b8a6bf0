//! The vote state machine.
//!
//! Pure decision logic for the voting engine: given the viewer's current
//! ledger value (if any) and the requested direction, decide what to write
//! to the ledger and how the post's score changes. The persistence layer
//! runs the resulting transition inside one transaction.

use serde::Serialize;

/// A vote request collapsed to one of its two legal directions.
///
/// Legacy rule, kept on purpose: exactly `-1` means downvote, any other
/// value means upvote. Magnitude is never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn from_value(value: i32) -> Self {
        if value == -1 {
            VoteDirection::Down
        } else {
            VoteDirection::Up
        }
    }

    /// The ledger value this direction stores: `+1` or `-1`.
    pub fn value(self) -> i16 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// What a vote request did, as observed after the transaction commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    /// First vote by this user on this post.
    Recorded,
    /// An existing vote was flipped to the opposite direction.
    Changed,
    /// Repeat of the existing vote; nothing was written.
    Unchanged,
}

/// The write the ledger and score need for one vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No ledger row exists: insert `value` and add it to the score.
    Insert { value: i16, score_delta: i64 },
    /// A row with the opposite value exists: update it and apply
    /// `2 * value` to the score (cancel the old vote, apply the new one).
    Flip { value: i16, score_delta: i64 },
    /// A row with the same value exists: idempotent no-op.
    Noop,
}

impl VoteTransition {
    pub fn decide(existing: Option<i16>, direction: VoteDirection) -> Self {
        let value = direction.value();
        match existing {
            None => VoteTransition::Insert {
                value,
                score_delta: i64::from(value),
            },
            Some(current) if current == value => VoteTransition::Noop,
            Some(_) => VoteTransition::Flip {
                value,
                score_delta: 2 * i64::from(value),
            },
        }
    }

    pub fn outcome(&self) -> VoteOutcome {
        match self {
            VoteTransition::Insert { .. } => VoteOutcome::Recorded,
            VoteTransition::Flip { .. } => VoteOutcome::Changed,
            VoteTransition::Noop => VoteOutcome::Unchanged,
        }
    }
}
