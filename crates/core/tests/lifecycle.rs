//! End-to-end lifecycle tests against an in-memory SQLite database and the
//! in-memory object store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use memento_common::{AppError, MemoryStorage, config::MediaConfig};
use memento_core::{
    CommentInput, EngagementService, FeedRefresher, FeedService, FilePayload, GalleryService,
    LikeState, RefreshTrigger,
};
use memento_db::{
    entities::comment,
    repositories::{CommentRepository, GalleryRepository, ImageRepository, LikeRepository},
    test_utils::TestDatabase,
};

struct App {
    galleries: GalleryService,
    feed: FeedService,
    engagement: EngagementService,
    images: ImageRepository,
    storage: Arc<MemoryStorage>,
    trigger: RefreshTrigger,
}

async fn app() -> App {
    let db = TestDatabase::in_memory().await.unwrap().into_shared();
    let storage = Arc::new(MemoryStorage::new("http://localhost:3000/files".to_string()));
    let trigger = RefreshTrigger::new();

    let gallery_repo = GalleryRepository::new(db.clone());
    let image_repo = ImageRepository::new(db.clone());

    App {
        galleries: GalleryService::new(
            gallery_repo.clone(),
            image_repo.clone(),
            storage.clone(),
            trigger.clone(),
            &MediaConfig::default(),
        ),
        feed: FeedService::new(gallery_repo, image_repo.clone()),
        engagement: EngagementService::new(
            CommentRepository::new(db.clone()),
            LikeRepository::new(db),
        ),
        images: image_repo,
        storage,
        trigger,
    }
}

fn files(names: &[&str]) -> Vec<FilePayload> {
    names
        .iter()
        .map(|name| FilePayload {
            file_name: (*name).to_string(),
            content_type: "image/jpeg".to_string(),
            data: name.as_bytes().to_vec(),
        })
        .collect()
}

#[tokio::test]
async fn test_sam_uploads_three_files() {
    let app = app().await;

    let created = app
        .galleries
        .create_gallery("Sam", files(&["a.jpg", "b.png", "c.heic"]))
        .await
        .unwrap();

    let gallery_id = &created.gallery.id;
    let mut paths: Vec<&str> = created.images.iter().map(|i| i.file_path.as_str()).collect();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), 3);
    for path in &paths {
        let (prefix, name) = path.split_once('/').unwrap();
        assert_eq!(prefix, gallery_id);
        let (stamp, rest) = name.split_once('-').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert!(rest.contains('.'));
        assert!(app.storage.contains(path));
    }

    let feed = app.feed.list_feed().await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].gallery.uploader_name, "Sam");
    assert_eq!(feed[0].images.len(), 3);
    for pair in feed[0].images.windows(2) {
        assert!((pair[0].created_at, &pair[0].id) >= (pair[1].created_at, &pair[1].id));
    }
}

#[tokio::test]
async fn test_delete_gallery_removes_records_and_objects() {
    let app = app().await;
    let created = app
        .galleries
        .create_gallery("Sam", files(&["1.jpg", "2.jpg"]))
        .await
        .unwrap();
    let gallery_id = created.gallery.id.clone();
    let mut expected: Vec<String> = created.images.iter().map(|i| i.file_path.clone()).collect();
    expected.sort();

    let outcome = app.galleries.delete_gallery(&gallery_id).await.unwrap();

    assert!(outcome.warning.is_none());
    assert!(app.images.find_by_gallery(&gallery_id).await.unwrap().is_empty());

    let calls = app.storage.delete_calls();
    assert_eq!(calls.len(), 1);
    let mut deleted = calls[0].clone();
    deleted.sort();
    assert_eq!(deleted, expected);
    assert!(app.storage.is_empty());

    assert!(app.feed.list_feed().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_missing_gallery_is_not_found() {
    let app = app().await;

    let result = app.galleries.delete_gallery("nope").await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(app.storage.delete_calls().is_empty());
}

#[tokio::test]
async fn test_list_feed_is_stable() {
    let app = app().await;
    app.galleries
        .create_gallery("Sam", files(&["a.jpg", "b.jpg"]))
        .await
        .unwrap();
    app.galleries
        .create_gallery("Alex", files(&["c.jpg"]))
        .await
        .unwrap();

    let first = app.feed.list_feed().await.unwrap();
    let second = app.feed.list_feed().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn test_append_and_delete_one_image() {
    let app = app().await;
    let created = app
        .galleries
        .create_gallery("Sam", files(&["a.jpg"]))
        .await
        .unwrap();
    let gallery_id = created.gallery.id.clone();

    let outcome = app
        .galleries
        .append_images(&gallery_id, files(&["b.jpg", "c.jpg"]))
        .await
        .unwrap();
    assert!(outcome.is_complete());
    assert_eq!(app.images.find_by_gallery(&gallery_id).await.unwrap().len(), 3);

    let victim = &outcome.images[0];
    let deleted = app.galleries.delete_image_by_id(&victim.id).await.unwrap();

    assert!(deleted.warning().is_none());
    assert!(!app.storage.contains(&victim.file_path));
    assert_eq!(app.images.find_by_gallery(&gallery_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_like_toggle_scenario() {
    let app = app().await;
    let created = app
        .galleries
        .create_gallery("Sam", files(&["a.jpg"]))
        .await
        .unwrap();
    let image_id = created.images[0].id.clone();

    let likes = app.engagement.like_count(&image_id).await.unwrap();
    let mut state = LikeState::new(image_id.clone(), likes);

    app.engagement.toggle_like(&mut state, "tok").await.unwrap();
    assert_eq!(state.likes, 1);
    assert_eq!(app.engagement.like_count(&image_id).await.unwrap(), 1);

    app.engagement.toggle_like(&mut state, "tok").await.unwrap();
    assert_eq!(state.likes, 0);
    assert_eq!(app.engagement.like_count(&image_id).await.unwrap(), 0);

    // A stale session that believes it liked never drives the count negative.
    let mut stale = LikeState {
        image_id: image_id.clone(),
        likes: 0,
        has_liked: true,
    };
    app.engagement.toggle_like(&mut stale, "tok").await.unwrap();
    assert_eq!(stale.likes, 0);
}

#[tokio::test]
async fn test_second_session_like_is_not_double_counted() {
    let app = app().await;
    let created = app
        .galleries
        .create_gallery("Sam", files(&["a.jpg"]))
        .await
        .unwrap();
    let image_id = created.images[0].id.clone();

    let mut first = LikeState::new(image_id.clone(), 0);
    let mut second = LikeState::new(image_id.clone(), 1);
    app.engagement.toggle_like(&mut first, "tok").await.unwrap();
    app.engagement.toggle_like(&mut second, "tok").await.unwrap();

    assert!(second.has_liked);
    assert_eq!(second.likes, 1);
    assert_eq!(app.engagement.like_count(&image_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_comments_newest_first_and_cascade() {
    let app = app().await;
    let created = app
        .galleries
        .create_gallery("Sam", files(&["a.jpg"]))
        .await
        .unwrap();
    let image_id = created.images[0].id.clone();

    app.engagement
        .add_comment(
            &image_id,
            CommentInput {
                name: Some(" Ana ".to_string()),
                text: "first".to_string(),
                is_anonymous: false,
            },
        )
        .await
        .unwrap();
    app.engagement
        .add_comment(
            &image_id,
            CommentInput {
                name: None,
                text: "second".to_string(),
                is_anonymous: true,
            },
        )
        .await
        .unwrap();

    let comments = app.engagement.list_comments(&image_id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().any(|c| c.commenter_name == "Ana"));
    assert!(
        comments
            .iter()
            .any(|c| c.commenter_name == comment::ANONYMOUS_NAME && c.is_anonymous)
    );

    app.galleries
        .delete_gallery(&created.gallery.id)
        .await
        .unwrap();
    assert!(app.engagement.list_comments(&image_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_comment_on_missing_image_is_not_found() {
    let app = app().await;

    let result = app
        .engagement
        .add_comment(
            "ghost",
            CommentInput {
                name: None,
                text: "hello".to_string(),
                is_anonymous: true,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_refresher_follows_mutations() {
    let app = app().await;
    let refresher = FeedRefresher::new(app.feed.clone(), app.trigger.clone());

    assert!(refresher.refresh().await.unwrap().entries.is_empty());

    app.galleries
        .create_gallery("Sam", files(&["a.jpg"]))
        .await
        .unwrap();
    let snapshot = refresher.refresh().await.unwrap();

    assert_eq!(snapshot.version, app.trigger.current());
    assert_eq!(snapshot.entries.len(), 1);
}
