//! Review and comment endpoints
//!
//! Reads are public. Creating needs an authenticated user; editing or
//! deleting needs the author, a moderator or an admin. A comment path is
//! only valid when its review belongs to the addressed title.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use yamdb_common::api::types::{
    CommentRequest, CommentResponse, PageResponse, ReviewRequest, ReviewResponse,
};
use yamdb_common::db::{comments, reviews, titles, Comment, Review};
use yamdb_common::permissions::{Access, Policy};
use yamdb_common::validation;
use yamdb_common::{Error, MessageKey};

use super::auth::Actor;
use crate::error::ApiResult;
use crate::pagination::{page_response, PageParams};
use crate::AppState;

async fn ensure_title(state: &AppState, title_id: i64) -> Result<(), Error> {
    if !titles::exists(&state.db, title_id).await? {
        return Err(state.messages.not_found(MessageKey::TitleNotFound));
    }
    Ok(())
}

async fn find_review(state: &AppState, title_id: i64, review_id: i64) -> Result<Review, Error> {
    ensure_title(state, title_id).await?;
    reviews::get(&state.db, title_id, review_id)
        .await?
        .ok_or_else(|| state.messages.not_found(MessageKey::ReviewNotFound))
}

async fn find_comment(
    state: &AppState,
    title_id: i64,
    review_id: i64,
    comment_id: i64,
) -> Result<Comment, Error> {
    let review = find_review(state, title_id, review_id).await?;
    comments::get(&state.db, review.id, comment_id)
        .await?
        .ok_or_else(|| state.messages.not_found(MessageKey::CommentNotFound))
}

// ========================================
// Reviews
// ========================================

/// GET /v1/titles/{title_id}/reviews/
pub async fn list_reviews(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(title_id): Path<i64>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<PageResponse<ReviewResponse>>> {
    let Query(params) = params?;
    ensure_title(&state, title_id).await?;

    let limit = params.limit(state.settings.default_page_limit);
    let offset = params.offset();
    let page = reviews::list(&state.db, title_id, limit, offset).await?;

    Ok(Json(page_response(page, &uri, limit, offset)))
}

/// POST /v1/titles/{title_id}/reviews/
///
/// A second review of the same title by the same author is a conflict.
pub async fn create_review(
    State(state): State<AppState>,
    actor: Actor,
    Path(title_id): Path<i64>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    actor.check(&state.messages, Policy::IsAuthorOrReadOnly, Access::Create, None)?;
    let author = actor.require(&state.messages)?;
    let Json(request) = payload?;
    let messages = &state.messages;

    ensure_title(&state, title_id).await?;

    let text = request.text.ok_or_else(|| validation::missing(messages, "text"))?;
    validation::required(messages, "text", &text)?;
    let score = request.score.ok_or_else(|| validation::missing(messages, "score"))?;
    validation::score(messages, score)?;

    let review = reviews::insert(&state.db, title_id, author.id, &text, score)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                Error::Conflict(messages.get(MessageKey::DuplicateReview).to_string())
            } else {
                e
            }
        })?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

/// GET /v1/titles/{title_id}/reviews/{review_id}/
pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> ApiResult<Json<ReviewResponse>> {
    let review = find_review(&state, title_id, review_id).await?;
    Ok(Json(ReviewResponse::from(review)))
}

/// PATCH /v1/titles/{title_id}/reviews/{review_id}/
pub async fn update_review(
    State(state): State<AppState>,
    actor: Actor,
    Path((title_id, review_id)): Path<(i64, i64)>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Json<ReviewResponse>> {
    let review = find_review(&state, title_id, review_id).await?;
    actor.check(
        &state.messages,
        Policy::IsAuthorOrReadOnly,
        Access::Modify,
        Some(review.author_id),
    )?;
    let Json(request) = payload?;
    let messages = &state.messages;

    if let Some(text) = &request.text {
        validation::required(messages, "text", text)?;
    }
    if let Some(score) = request.score {
        validation::score(messages, score)?;
    }

    let updated = reviews::update(&state.db, review.id, request.text.as_deref(), request.score)
        .await?
        .ok_or_else(|| messages.not_found(MessageKey::ReviewNotFound))?;

    Ok(Json(ReviewResponse::from(updated)))
}

/// DELETE /v1/titles/{title_id}/reviews/{review_id}/
pub async fn delete_review(
    State(state): State<AppState>,
    actor: Actor,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let review = find_review(&state, title_id, review_id).await?;
    actor.check(
        &state.messages,
        Policy::IsAuthorOrReadOnly,
        Access::Modify,
        Some(review.author_id),
    )?;

    reviews::delete(&state.db, review.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========================================
// Comments
// ========================================

/// GET /v1/titles/{title_id}/reviews/{review_id}/comments/
pub async fn list_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((title_id, review_id)): Path<(i64, i64)>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<PageResponse<CommentResponse>>> {
    let Query(params) = params?;
    let review = find_review(&state, title_id, review_id).await?;

    let limit = params.limit(state.settings.default_page_limit);
    let offset = params.offset();
    let page = comments::list(&state.db, review.id, limit, offset).await?;

    Ok(Json(page_response(page, &uri, limit, offset)))
}

/// POST /v1/titles/{title_id}/reviews/{review_id}/comments/
pub async fn create_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path((title_id, review_id)): Path<(i64, i64)>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    actor.check(&state.messages, Policy::IsAuthorOrReadOnly, Access::Create, None)?;
    let author = actor.require(&state.messages)?;
    let Json(request) = payload?;
    let messages = &state.messages;

    let review = find_review(&state, title_id, review_id).await?;

    let text = request.text.ok_or_else(|| validation::missing(messages, "text"))?;
    validation::required(messages, "text", &text)?;

    let comment = comments::insert(&state.db, review.id, title_id, author.id, &text).await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// GET /v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/
pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<Json<CommentResponse>> {
    let comment = find_comment(&state, title_id, review_id, comment_id).await?;
    Ok(Json(CommentResponse::from(comment)))
}

/// PATCH /v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/
pub async fn update_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<Json<CommentResponse>> {
    let comment = find_comment(&state, title_id, review_id, comment_id).await?;
    actor.check(
        &state.messages,
        Policy::IsAuthorOrReadOnly,
        Access::Modify,
        Some(comment.author_id),
    )?;
    let Json(request) = payload?;
    let messages = &state.messages;

    let Some(text) = request.text else {
        return Ok(Json(CommentResponse::from(comment)));
    };
    validation::required(messages, "text", &text)?;

    let updated = comments::update(&state.db, comment.id, &text)
        .await?
        .ok_or_else(|| messages.not_found(MessageKey::CommentNotFound))?;

    Ok(Json(CommentResponse::from(updated)))
}

/// DELETE /v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/
pub async fn delete_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<StatusCode> {
    let comment = find_comment(&state, title_id, review_id, comment_id).await?;
    actor.check(
        &state.messages,
        Policy::IsAuthorOrReadOnly,
        Access::Modify,
        Some(comment.author_id),
    )?;

    comments::delete(&state.db, comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/titles/:title_id/reviews/",
            get(list_reviews).post(create_review),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/",
            get(get_review).patch(update_review).delete(delete_review),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/comments/",
            get(list_comments).post(create_comment),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/comments/:comment_id/",
            get(get_comment).patch(update_comment).delete(delete_comment),
        )
}
