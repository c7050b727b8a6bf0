use async_trait::async_trait;

use crate::domain::{NewPost, NewUser, Post, User};
use crate::error::RepoError;
use crate::feed::{FeedPage, FeedQuery};

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with [`RepoError::Constraint`] when the
    /// username or email is already taken.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;

    /// Look up a user by username or by email; the caller decides which one
    /// the login string is (it is an email iff it contains `@`).
    async fn find_by_login(&self, username_or_email: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository, including the cursor-paginated feed read.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError>;

    /// Update title and/or text. Returns the updated post, or `None` when
    /// the post does not exist. Ownership is checked by the caller.
    async fn update_content(
        &self,
        id: i64,
        title: Option<String>,
        text: Option<String>,
    ) -> Result<Option<Post>, RepoError>;

    /// Delete a post. Ledger entries referencing it are removed by the
    /// store's cascade. Fails with [`RepoError::NotFound`] when absent.
    async fn delete(&self, id: i64) -> Result<(), RepoError>;

    /// Read one page of the feed: newest first, strictly older than the
    /// cursor, clamped page size, per-viewer vote status attached.
    async fn feed(&self, query: FeedQuery) -> Result<FeedPage, RepoError>;
}
