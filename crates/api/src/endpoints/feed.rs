//! Feed endpoints.

use axum::{Router, extract::State, routing::post};
use memento_common::AppResult;
use memento_core::{FeedEntry, FeedSnapshot};

use crate::{middleware::AppState, response::ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feed", post(list_feed))
        .route("/feed/latest", post(latest_feed))
}

/// Load the whole feed from the database.
async fn list_feed(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<FeedEntry>>> {
    let entries = state.feed_service.list_feed().await?;
    Ok(ApiResponse::ok(entries))
}

/// Return the last published feed snapshot, loading one if none exists yet.
async fn latest_feed(State(state): State<AppState>) -> AppResult<ApiResponse<FeedSnapshot>> {
    let snapshot = state.feed_refresher.latest();
    if snapshot.is_loaded() {
        return Ok(ApiResponse::ok(snapshot));
    }

    let snapshot = state.feed_refresher.refresh().await?;
    Ok(ApiResponse::ok(snapshot))
}
