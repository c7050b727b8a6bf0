use async_trait::async_trait;

use crate::domain::{VoteDirection, VoteOutcome};
use crate::error::VoteError;

/// The voting engine: one atomic ledger + score transition per call.
///
/// `user_id` is a resolved, already-authenticated identity; the engine never
/// reads ambient state. Implementations must guarantee that the ledger write
/// and the score update commit together or not at all, and that concurrent
/// votes on the same (user, post) pair serialize rather than both winning.
#[async_trait]
pub trait VotingEngine: Send + Sync {
    async fn apply_vote(
        &self,
        user_id: i64,
        post_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, VoteError>;
}
