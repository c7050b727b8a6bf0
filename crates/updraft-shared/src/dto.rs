//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login. `login` is a username or an email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

/// Response containing a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub token_type: String,
    pub user: UserResponse,
}

/// Request to create a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub text: String,
}

/// Request to update a post. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub text: Option<String>,
}

/// Public author fields embedded in a post response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAuthorResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// One post in a feed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPostResponse {
    pub id: i64,
    pub title: String,
    /// Truncated body preview; the full text is on the single-post route.
    pub text_snippet: String,
    pub points: i64,
    pub creator: PostAuthorResponse,
    /// The requesting viewer's own vote on this post, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_status: Option<i16>,
    pub created_at: String,
}

/// One page of the post feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedPostsResponse {
    pub posts: Vec<FeedPostResponse>,
    pub has_more: bool,
    /// Opaque cursor for the next page; present iff `has_more`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// A single post with its full body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    pub text: String,
    pub points: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Request to vote on a post. Exactly `-1` is a downvote; any other value
/// is an upvote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub value: i32,
}

/// Result of a vote request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    /// What the vote did: "recorded", "changed" or "unchanged".
    pub outcome: String,
}
