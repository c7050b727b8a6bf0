//! The Postgres voting engine.
//!
//! One `apply_vote` call is one database transaction: read the ledger row
//! under an exclusive lock, decide the transition, write the ledger and the
//! score together, commit. Rollback on any failure leaves both untouched,
//! so the score can never drift from the ledger.
//!
//! Concurrency: the composite primary key on (user_id, post_id) plus the
//! `FOR UPDATE` read serialize conflicting votes. A racing duplicate insert
//! aborts the transaction with a unique violation; the whole
//! read-decide-write cycle is then retried once as a fresh transaction,
//! which observes the winner's row and resolves to a flip or a no-op.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbConn, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set, SqlErr, TransactionError, TransactionTrait,
};

use updraft_core::domain::{VoteDirection, VoteOutcome, VoteTransition};
use updraft_core::error::VoteError;
use updraft_core::ports::VotingEngine;

use super::entity::post::{self, Entity as PostEntity};
use super::entity::updoot::{self, Entity as UpdootEntity};

pub struct PgVotingEngine {
    db: Arc<DbConn>,
}

impl PgVotingEngine {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }

    async fn try_apply(
        &self,
        user_id: i64,
        post_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, VoteError> {
        let result = self
            .db
            .transaction::<_, VoteOutcome, VoteError>(move |txn| {
                Box::pin(async move { vote_in_txn(txn, user_id, post_id, direction).await })
            })
            .await;

        result.map_err(|e| match e {
            TransactionError::Connection(db_err) => VoteError::Transaction(db_err.to_string()),
            TransactionError::Transaction(vote_err) => vote_err,
        })
    }
}

#[async_trait]
impl VotingEngine for PgVotingEngine {
    async fn apply_vote(
        &self,
        user_id: i64,
        post_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, VoteError> {
        match self.try_apply(user_id, post_id, direction).await {
            Err(VoteError::Contended(_)) => {
                // A concurrent vote by the same user won the insert race.
                // Re-run the whole cycle: the fresh read sees their row.
                tracing::debug!(user_id, post_id, "vote lost an insert race, retrying once");
                self.try_apply(user_id, post_id, direction).await
            }
            other => other,
        }
    }
}

async fn vote_in_txn(
    txn: &DatabaseTransaction,
    user_id: i64,
    post_id: i64,
    direction: VoteDirection,
) -> Result<VoteOutcome, VoteError> {
    // The post must exist before any ledger write.
    let post = PostEntity::find_by_id(post_id)
        .one(txn)
        .await
        .map_err(transaction_err)?;
    if post.is_none() {
        return Err(VoteError::PostNotFound(post_id));
    }

    // Row lock: a concurrent vote on the same (user, post) pair waits here
    // until this transaction commits or rolls back.
    let existing = UpdootEntity::find_by_id((user_id, post_id))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(transaction_err)?;

    let transition = VoteTransition::decide(existing.map(|e| e.value), direction);

    match transition {
        VoteTransition::Insert { value, score_delta } => {
            updoot::ActiveModel {
                user_id: Set(user_id),
                post_id: Set(post_id),
                value: Set(value),
            }
            .insert(txn)
            .await
            .map_err(|e| classify_insert_err(e, post_id))?;

            bump_points(txn, post_id, score_delta).await?;
            tracing::debug!(user_id, post_id, value, "vote recorded");
            Ok(VoteOutcome::Recorded)
        }
        VoteTransition::Flip { value, score_delta } => {
            let updated = UpdootEntity::update_many()
                .col_expr(updoot::Column::Value, Expr::value(value))
                .filter(updoot::Column::UserId.eq(user_id))
                .filter(updoot::Column::PostId.eq(post_id))
                .exec(txn)
                .await
                .map_err(transaction_err)?;

            // The row was read under lock in this transaction.
            if updated.rows_affected == 0 {
                return Err(VoteError::Transaction(
                    "locked vote row disappeared mid-transaction".to_string(),
                ));
            }

            bump_points(txn, post_id, score_delta).await?;
            tracing::debug!(user_id, post_id, value, "vote changed");
            Ok(VoteOutcome::Changed)
        }
        VoteTransition::Noop => {
            tracing::debug!(user_id, post_id, "repeat vote ignored");
            Ok(VoteOutcome::Unchanged)
        }
    }
}

/// Apply a score delta to the post, inside the same transaction as the
/// ledger write.
async fn bump_points(
    txn: &DatabaseTransaction,
    post_id: i64,
    delta: i64,
) -> Result<(), VoteError> {
    let result = PostEntity::update_many()
        .col_expr(
            post::Column::Points,
            Expr::col(post::Column::Points).add(delta),
        )
        .filter(post::Column::Id.eq(post_id))
        .exec(txn)
        .await
        .map_err(transaction_err)?;

    if result.rows_affected == 0 {
        // Existence was checked in this transaction; a cascade delete from
        // a concurrent post deletion is the only way to get here.
        return Err(VoteError::PostNotFound(post_id));
    }

    Ok(())
}

fn transaction_err(e: DbErr) -> VoteError {
    VoteError::Transaction(e.to_string())
}

/// A unique violation on the ledger insert means a concurrent vote by the
/// same user committed first; a foreign-key violation means the post was
/// deleted underneath us.
fn classify_insert_err(e: DbErr, post_id: i64) -> VoteError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => VoteError::Contended(post_id),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => VoteError::PostNotFound(post_id),
        _ => {
            let msg = e.to_string();
            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                VoteError::Contended(post_id)
            } else {
                VoteError::Transaction(msg)
            }
        }
    }
}
