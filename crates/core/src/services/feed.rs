//! Feed assembly: every gallery with its images, newest first.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use futures::future::try_join_all;
use memento_common::AppResult;
use memento_db::{
    entities::{gallery, image},
    repositories::{GalleryRepository, ImageRepository},
};
use serde::Serialize;
use tokio::sync::watch;

use super::refresh::RefreshTrigger;

/// A gallery and its images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    #[serde(flatten)]
    pub gallery: gallery::Model,
    pub images: Vec<image::Model>,
}

/// Read-only feed queries.
#[derive(Clone)]
pub struct FeedService {
    gallery_repo: GalleryRepository,
    image_repo: ImageRepository,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(gallery_repo: GalleryRepository, image_repo: ImageRepository) -> Self {
        Self {
            gallery_repo,
            image_repo,
        }
    }

    /// Load the whole feed.
    ///
    /// Galleries and the images inside each are ordered by creation time,
    /// newest first, with the id as tie-break. Image queries for all
    /// galleries run concurrently; any failure fails the whole load.
    pub async fn list_feed(&self) -> AppResult<Vec<FeedEntry>> {
        let galleries = self.gallery_repo.find_all().await?;

        let images = try_join_all(
            galleries
                .iter()
                .map(|g| self.image_repo.find_by_gallery(&g.id)),
        )
        .await?;

        let entries: Vec<FeedEntry> = galleries
            .into_iter()
            .zip(images)
            .map(|(gallery, images)| FeedEntry { gallery, images })
            .collect();

        tracing::debug!(galleries = entries.len(), "Feed loaded");
        Ok(entries)
    }
}

/// A published feed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    /// Mutation counter value the load was requested at.
    pub version: u64,
    /// Sequence number of the refresh that produced this snapshot. Zero
    /// until the first load completes.
    pub request: u64,
    pub entries: Vec<FeedEntry>,
}

impl FeedSnapshot {
    /// Whether any load has been published yet.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.request > 0
    }
}

/// Keeps a shared feed snapshot up to date.
///
/// Each [`refresh`](Self::refresh) takes a sequence number before it starts
/// loading. A finished load is published only when no later request has
/// published already, so a slow response never overwrites a newer one.
#[derive(Clone)]
pub struct FeedRefresher {
    feed: FeedService,
    trigger: RefreshTrigger,
    tx: Arc<watch::Sender<FeedSnapshot>>,
    requests: Arc<AtomicU64>,
}

impl FeedRefresher {
    /// Create a refresher publishing loads of `feed`, driven by `trigger`.
    #[must_use]
    pub fn new(feed: FeedService, trigger: RefreshTrigger) -> Self {
        let (tx, _rx) = watch::channel(FeedSnapshot::default());
        Self {
            feed,
            trigger,
            tx: Arc::new(tx),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Receive every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.tx.subscribe()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> FeedSnapshot {
        self.tx.borrow().clone()
    }

    /// Reload the feed and publish it unless a newer load got there first.
    ///
    /// Returns the snapshot current after the attempt.
    pub async fn refresh(&self) -> AppResult<FeedSnapshot> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        let version = self.trigger.current();

        let entries = self.feed.list_feed().await?;
        self.publish(FeedSnapshot {
            version,
            request,
            entries,
        });

        Ok(self.latest())
    }

    fn publish(&self, snapshot: FeedSnapshot) -> bool {
        let (version, request) = (snapshot.version, snapshot.request);

        let published = self.tx.send_if_modified(|current| {
            if request > current.request {
                *current = snapshot;
                true
            } else {
                false
            }
        });

        if published {
            tracing::debug!(version, request, "Feed snapshot published");
        } else {
            tracing::debug!(version, request, "Discarding stale feed snapshot");
        }
        published
    }

    /// Refresh once, then again after every bump of the trigger.
    ///
    /// Runs until the task is aborted. Failed loads are logged and leave the
    /// previous snapshot in place.
    pub async fn run(self) {
        let mut changes = self.trigger.subscribe();

        loop {
            if let Err(e) = self.refresh().await {
                tracing::warn!(error = %e, "Feed refresh failed");
            }

            if changes.changed().await.is_err() {
                break;
            }
            changes.borrow_and_update();
        }
    }
}
