//! Shared application state.

use std::sync::Arc;

use memento_common::{SharedStorage, config::MediaConfig};
use memento_core::{
    EngagementService, FeedRefresher, FeedService, GalleryService, RefreshTrigger,
};
use memento_db::repositories::{
    CommentRepository, GalleryRepository, ImageRepository, LikeRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub gallery_service: GalleryService,
    pub feed_service: FeedService,
    pub feed_refresher: FeedRefresher,
    pub engagement_service: EngagementService,
}

impl AppState {
    /// Wire repositories and services over one database and object store.
    ///
    /// Mutations made through `gallery_service` bump the trigger that
    /// `feed_refresher` follows.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, storage: SharedStorage, media: &MediaConfig) -> Self {
        let gallery_repo = GalleryRepository::new(Arc::clone(&db));
        let image_repo = ImageRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let like_repo = LikeRepository::new(db);

        let trigger = RefreshTrigger::new();
        let feed_service = FeedService::new(gallery_repo.clone(), image_repo.clone());

        Self {
            gallery_service: GalleryService::new(
                gallery_repo,
                image_repo,
                storage,
                trigger.clone(),
                media,
            ),
            feed_refresher: FeedRefresher::new(feed_service.clone(), trigger),
            feed_service,
            engagement_service: EngagementService::new(comment_repo, like_repo),
        }
    }
}
