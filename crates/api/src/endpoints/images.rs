//! Image endpoints: deletion, likes and comments.

use axum::{Json, Router, extract::State, routing::post};
use memento_common::AppResult;
use memento_core::{CommentInput, DeleteImageOutcome, LikeState};
use memento_db::entities::comment;
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Request naming one image.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub image_id: String,
}

/// Request naming one image and the voter acting on it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub image_id: String,
    pub voter_token: String,
}

/// Request to post a comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub image_id: String,
    #[serde(flatten)]
    pub input: CommentInput,
}

/// Like count of an image.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeCountResponse {
    pub image_id: String,
    pub likes: u64,
}

/// Result of an unlike.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlikeResponse {
    pub removed: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/delete", post(delete_image))
        .route("/likes/count", post(like_count))
        .route("/likes/state", post(like_state))
        .route("/like", post(like))
        .route("/unlike", post(unlike))
        .route("/comments", post(list_comments))
        .route("/comments/create", post(create_comment))
}

/// Delete one image. The storage path is taken from its record.
async fn delete_image(
    State(state): State<AppState>,
    Json(req): Json<ImageRequest>,
) -> AppResult<ApiResponse<DeleteImageOutcome>> {
    let outcome = state
        .gallery_service
        .delete_image_by_id(&req.image_id)
        .await?;
    let warning = outcome.warning().cloned();
    if let Some(warning) = &warning {
        tracing::warn!(image_id = %req.image_id, warning = %warning, "Image delete left stores out of step");
    }
    Ok(ApiResponse::with_warning(outcome, warning))
}

async fn like_count(
    State(state): State<AppState>,
    Json(req): Json<ImageRequest>,
) -> AppResult<ApiResponse<LikeCountResponse>> {
    let likes = state.engagement_service.like_count(&req.image_id).await?;
    Ok(ApiResponse::ok(LikeCountResponse {
        image_id: req.image_id,
        likes,
    }))
}

async fn like_state(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<LikeState>> {
    let like_state = state
        .engagement_service
        .like_state(&req.image_id, &req.voter_token)
        .await?;
    Ok(ApiResponse::ok(like_state))
}

/// Like an image. Liking twice with one token is a conflict.
async fn like(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<LikeCountResponse>> {
    state
        .engagement_service
        .like(&req.image_id, &req.voter_token)
        .await?;
    let likes = state.engagement_service.like_count(&req.image_id).await?;
    Ok(ApiResponse::ok(LikeCountResponse {
        image_id: req.image_id,
        likes,
    }))
}

async fn unlike(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<UnlikeResponse>> {
    let removed = state
        .engagement_service
        .unlike(&req.image_id, &req.voter_token)
        .await?;
    Ok(ApiResponse::ok(UnlikeResponse { removed }))
}

async fn list_comments(
    State(state): State<AppState>,
    Json(req): Json<ImageRequest>,
) -> AppResult<ApiResponse<Vec<comment::Model>>> {
    let comments = state
        .engagement_service
        .list_comments(&req.image_id)
        .await?;
    Ok(ApiResponse::ok(comments))
}

async fn create_comment(
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state
        .engagement_service
        .add_comment(&req.image_id, req.input)
        .await?;
    Ok(ApiResponse::ok(comment))
}
