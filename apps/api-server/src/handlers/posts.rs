//! Post handlers: CRUD, the cursor-paginated feed, and voting.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use updraft_core::domain::{NewPost, Post, VoteDirection, VoteOutcome};
use updraft_core::feed::{FeedPost, FeedQuery, decode_cursor, encode_cursor};
use updraft_shared::dto::{
    CreatePostRequest, FeedPostResponse, PaginatedPostsResponse, PostAuthorResponse, PostResponse,
    UpdatePostRequest, VoteRequest, VoteResponse,
};

use crate::middleware::auth::{Identity, MaybeIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Feed listings show at most this many characters of the body.
const SNIPPET_CHARS: usize = 150;

const DEFAULT_FEED_LIMIT: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub limit: Option<u64>,
    pub cursor: Option<String>,
}

fn post_response(post: &Post) -> PostResponse {
    PostResponse {
        id: post.id,
        creator_id: post.creator_id,
        title: post.title.clone(),
        text: post.text.clone(),
        points: post.points,
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

fn feed_post_response(entry: &FeedPost) -> FeedPostResponse {
    FeedPostResponse {
        id: entry.post.id,
        title: entry.post.title.clone(),
        text_snippet: entry.post.snippet(SNIPPET_CHARS),
        points: entry.post.points,
        creator: PostAuthorResponse {
            id: entry.creator.id,
            username: entry.creator.username.clone(),
            email: entry.creator.email.clone(),
        },
        vote_status: entry.vote_status,
        created_at: entry.post.created_at.to_rfc3339(),
    }
}

/// GET /api/posts - the feed, newest first.
///
/// Anonymous viewers get the page without vote status; authenticated
/// viewers additionally see their own vote on each post.
pub async fn list(
    state: web::Data<AppState>,
    params: web::Query<FeedParams>,
    viewer: MaybeIdentity,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();

    let cursor = match &params.cursor {
        Some(raw) => Some(
            decode_cursor(raw).ok_or_else(|| AppError::BadRequest("invalid cursor".to_string()))?,
        ),
        None => None,
    };

    let page = state
        .posts
        .feed(FeedQuery {
            limit: params.limit.unwrap_or(DEFAULT_FEED_LIMIT),
            cursor,
            viewer_id: viewer.0.map(|i| i.user_id),
        })
        .await?;

    let next_cursor = if page.has_more {
        page.posts
            .last()
            .map(|entry| encode_cursor(entry.post.created_at))
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(PaginatedPostsResponse {
        posts: page.posts.iter().map(feed_post_response).collect(),
        has_more: page.has_more,
        next_cursor,
    }))
}

/// GET /api/posts/{id} - a single post with its full body.
pub async fn get(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))?;

    Ok(HttpResponse::Ok().json(post_response(&post)))
}

/// POST /api/posts - create a post (authenticated).
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("text must not be empty".to_string()));
    }

    let post = state
        .posts
        .create(NewPost {
            creator_id: identity.user_id,
            title: req.title,
            text: req.text,
        })
        .await?;

    Ok(HttpResponse::Created().json(post_response(&post)))
}

/// PATCH /api/posts/{id} - update title/text (creator only).
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    if req.title.is_none() && req.text.is_none() {
        return Err(AppError::BadRequest("nothing to update".to_string()));
    }

    require_creator(&state, id, identity.user_id).await?;

    let updated = state
        .posts
        .update_content(id, req.title, req.text)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))?;

    Ok(HttpResponse::Ok().json(post_response(&updated)))
}

/// DELETE /api/posts/{id} - delete a post (creator only). Ledger entries
/// cascade with it.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    require_creator(&state, id, identity.user_id).await?;
    state.posts.delete(id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/vote - apply an up/down vote (authenticated).
///
/// Failures surface as typed errors; a 200 always means the vote landed
/// (or was already in place), never a silent false.
pub async fn vote(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<VoteRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let direction = VoteDirection::from_value(body.value);

    let outcome = state
        .votes
        .apply_vote(identity.user_id, post_id, direction)
        .await?;

    Ok(HttpResponse::Ok().json(VoteResponse {
        outcome: outcome_label(outcome).to_string(),
    }))
}

fn outcome_label(outcome: VoteOutcome) -> &'static str {
    match outcome {
        VoteOutcome::Recorded => "recorded",
        VoteOutcome::Changed => "changed",
        VoteOutcome::Unchanged => "unchanged",
    }
}

/// Posts are mutable only by their creator.
async fn require_creator(state: &AppState, post_id: i64, user_id: i64) -> AppResult<()> {
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", post_id)))?;

    if post.creator_id != user_id {
        return Err(AppError::Forbidden);
    }

    Ok(())
}
