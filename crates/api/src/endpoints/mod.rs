//! API endpoints.

mod feed;
mod galleries;
mod images;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(feed::router())
        .nest("/galleries", galleries::router())
        .nest("/images", images::router())
}
