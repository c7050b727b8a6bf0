//! PostgreSQL repository implementations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, NotSet, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};

use updraft_core::domain::{NewPost, NewUser, Post, User};
use updraft_core::error::RepoError;
use updraft_core::feed::{FeedPage, FeedPost, FeedQuery, PostAuthor, clamp_limit};
use updraft_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::updoot::{self, Entity as UpdootEntity};
use super::entity::user::{self, Entity as UserEntity};

/// Classify a write error: unique-key violations become `Constraint`,
/// everything else stays a generic query failure.
pub(crate) fn map_write_err(e: DbErr) -> RepoError {
    if let Some(SqlErr::UniqueConstraintViolation(msg)) = e.sql_err() {
        return RepoError::Constraint(msg);
    }
    let msg = e.to_string();
    if msg.contains("duplicate key") || msg.contains("unique constraint") {
        RepoError::Constraint(msg)
    } else {
        RepoError::Query(msg)
    }
}

fn map_read_err(e: DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: Arc<DbConn>,
}

impl PostgresUserRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let model = user::ActiveModel {
            id: NotSet,
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(map_write_err)?;

        tracing::debug!(user_id = model.id, "User created");
        Ok(model.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_read_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_login(&self, username_or_email: &str) -> Result<Option<User>, RepoError> {
        let login = username_or_email.to_lowercase();

        // An email iff it contains '@' - usernames may not contain one.
        let filter = if login.contains('@') {
            user::Column::Email.eq(login)
        } else {
            user::Column::Username.eq(login)
        };

        let result = UserEntity::find()
            .filter(filter)
            .one(self.db.as_ref())
            .await
            .map_err(map_read_err)?;

        Ok(result.map(Into::into))
    }
}

/// PostgreSQL post repository, including the feed read.
pub struct PostgresPostRepository {
    db: Arc<DbConn>,
}

impl PostgresPostRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let model = post::ActiveModel {
            id: NotSet,
            creator_id: Set(new_post.creator_id),
            title: Set(new_post.title),
            text: Set(new_post.text),
            points: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(map_write_err)?;

        tracing::debug!(post_id = model.id, creator_id = model.creator_id, "Post created");
        Ok(model.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_read_err)?;

        Ok(result.map(Into::into))
    }

    async fn update_content(
        &self,
        id: i64,
        title: Option<String>,
        text: Option<String>,
    ) -> Result<Option<Post>, RepoError> {
        let Some(existing) = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_read_err)?
        else {
            return Ok(None);
        };

        let mut active: post::ActiveModel = existing.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(text) = text {
            active.text = Set(text);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(self.db.as_ref()).await.map_err(map_write_err)?;
        Ok(Some(updated.into()))
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_read_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::debug!(post_id = id, "Post deleted");
        Ok(())
    }

    async fn feed(&self, query: FeedQuery) -> Result<FeedPage, RepoError> {
        let limit = clamp_limit(query.limit);

        // Fetch one spare row; it only tells us whether another page exists.
        let mut select = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit + 1);

        if let Some(cursor) = query.cursor {
            let cursor: DateTimeWithTimeZone = cursor.into();
            select = select.filter(post::Column::CreatedAt.lt(cursor));
        }

        let mut rows = select.all(self.db.as_ref()).await.map_err(map_read_err)?;

        let has_more = rows.len() as u64 == limit + 1;
        rows.truncate(limit as usize);

        let creators = self.load_creators(&rows).await?;
        let votes = self.load_viewer_votes(query.viewer_id, &rows).await?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            let creator = creators
                .get(&row.creator_id)
                .cloned()
                .ok_or_else(|| RepoError::Query(format!("post {} has no creator row", row.id)))?;
            let vote_status = votes.get(&row.id).copied();

            posts.push(FeedPost {
                creator,
                vote_status,
                post: row.into(),
            });
        }

        Ok(FeedPage { posts, has_more })
    }
}

impl PostgresPostRepository {
    /// One batched creator lookup per page, never one query per post.
    async fn load_creators(
        &self,
        rows: &[post::Model],
    ) -> Result<HashMap<i64, PostAuthor>, RepoError> {
        if rows.is_empty() {
            return Ok(HashMap::new());
        }

        let creator_ids: HashSet<i64> = rows.iter().map(|r| r.creator_id).collect();
        let users = UserEntity::find()
            .filter(user::Column::Id.is_in(creator_ids))
            .all(self.db.as_ref())
            .await
            .map_err(map_read_err)?;

        Ok(users
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    PostAuthor {
                        id: u.id,
                        username: u.username,
                        email: u.email,
                    },
                )
            })
            .collect())
    }

    /// The viewer's own ledger rows for this page. Scoped to the viewer id
    /// by construction - no other user's vote can ever appear here.
    async fn load_viewer_votes(
        &self,
        viewer_id: Option<i64>,
        rows: &[post::Model],
    ) -> Result<HashMap<i64, i16>, RepoError> {
        let Some(viewer_id) = viewer_id else {
            return Ok(HashMap::new());
        };
        if rows.is_empty() {
            return Ok(HashMap::new());
        }

        let post_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let entries = UpdootEntity::find()
            .filter(updoot::Column::UserId.eq(viewer_id))
            .filter(updoot::Column::PostId.is_in(post_ids))
            .all(self.db.as_ref())
            .await
            .map_err(map_read_err)?;

        Ok(entries.into_iter().map(|e| (e.post_id, e.value)).collect())
    }
}
