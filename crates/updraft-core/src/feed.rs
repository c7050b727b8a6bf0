//! Feed pagination primitives.
//!
//! The feed is cursor-paginated: strictly ordered by creation time
//! descending, with an opaque cursor encoding a millisecond timestamp.
//! Pages are read by fetching one row more than requested; the spare row
//! only signals that another page exists.

use chrono::{DateTime, Utc};

use crate::domain::Post;

/// Hard server-side cap on page size, regardless of what was requested.
pub const MAX_FEED_LIMIT: u64 = 50;

/// Clamp a requested page size to the server cap. Floored at one row so a
/// non-empty feed always yields a post to derive the next cursor from.
pub fn clamp_limit(limit: u64) -> u64 {
    limit.clamp(1, MAX_FEED_LIMIT)
}

/// Encode a post's creation time as an opaque cursor.
pub fn encode_cursor(created_at: DateTime<Utc>) -> String {
    created_at.timestamp_millis().to_string()
}

/// Decode a cursor back to a timestamp. `None` means the cursor is garbage.
pub fn decode_cursor(raw: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = raw.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Parameters of one feed read.
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub limit: u64,
    /// Only posts strictly older than this timestamp are returned.
    pub cursor: Option<DateTime<Utc>>,
    /// When present, each post carries this viewer's own vote value.
    pub viewer_id: Option<i64>,
}

/// Public author fields attached to each feed post.
#[derive(Debug, Clone)]
pub struct PostAuthor {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// One post as seen by the requesting viewer.
#[derive(Debug, Clone)]
pub struct FeedPost {
    pub post: Post,
    pub creator: PostAuthor,
    /// The viewer's own ledger value for this post, never anyone else's.
    pub vote_status: Option<i16>,
}

/// One page of the feed.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<FeedPost>,
    pub has_more: bool,
}
