//! Database integration tests.
//!
//! Most tests run against an in-memory SQLite database so foreign-key
//! cascades and unique indexes are exercised for real. The `PostgreSQL`
//! tests need a running instance:
//!   `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `memento_test`)
//!   `TEST_DB_PASSWORD` (default: `memento_test`)
//!   `TEST_DB_NAME` (default: `memento_test`)

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use memento_common::AppError;
use memento_db::{
    entities::{comment, gallery, image, image_like},
    repositories::{CommentRepository, GalleryRepository, ImageRepository, LikeRepository},
    test_utils::{TestDatabase, TestDbConfig},
};
use sea_orm::Set;

struct Repos {
    galleries: GalleryRepository,
    images: ImageRepository,
    comments: CommentRepository,
    likes: LikeRepository,
}

async fn setup() -> Repos {
    let db = TestDatabase::in_memory().await.unwrap().into_shared();
    Repos {
        galleries: GalleryRepository::new(db.clone()),
        images: ImageRepository::new(db.clone()),
        comments: CommentRepository::new(db.clone()),
        likes: LikeRepository::new(db),
    }
}

async fn seed_gallery(repos: &Repos, id: &str) {
    repos
        .galleries
        .create(gallery::ActiveModel {
            id: Set(id.to_string()),
            uploader_name: Set("Sam".to_string()),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap();
}

fn image_row(id: &str, gallery_id: &str) -> image::Model {
    image::Model {
        id: id.to_string(),
        gallery_id: gallery_id.to_string(),
        image_url: format!("/files/{gallery_id}/{id}.png"),
        file_path: format!("{gallery_id}/{id}.png"),
        created_at: Utc::now().into(),
    }
}

fn like(id: &str, image_id: &str, token: &str) -> image_like::ActiveModel {
    image_like::ActiveModel {
        id: Set(id.to_string()),
        image_id: Set(image_id.to_string()),
        voter_token: Set(token.to_string()),
        created_at: Set(Utc::now().into()),
    }
}

#[tokio::test]
async fn test_batch_insert_and_paths() {
    let repos = setup().await;
    seed_gallery(&repos, "g1").await;

    repos
        .images
        .create_many(&[image_row("i1", "g1"), image_row("i2", "g1")])
        .await
        .unwrap();

    let mut paths = repos.images.find_paths_by_gallery("g1").await.unwrap();
    paths.sort();
    assert_eq!(paths, vec!["g1/i1.png", "g1/i2.png"]);
}

#[tokio::test]
async fn test_batch_insert_is_all_or_nothing() {
    let repos = setup().await;
    seed_gallery(&repos, "g1").await;

    // Second row points at a gallery that does not exist.
    let result = repos
        .images
        .create_many(&[image_row("i1", "g1"), image_row("i2", "nope")])
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));
    assert!(repos.images.find_by_gallery("g1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gallery_delete_cascades() {
    let repos = setup().await;
    seed_gallery(&repos, "g1").await;
    repos
        .images
        .create_many(&[image_row("i1", "g1")])
        .await
        .unwrap();
    repos.likes.create(like("l1", "i1", "tok")).await.unwrap();
    repos
        .comments
        .create(comment::ActiveModel {
            id: Set("c1".to_string()),
            image_id: Set("i1".to_string()),
            commenter_name: Set(comment::ANONYMOUS_NAME.to_string()),
            comment_text: Set("lovely".to_string()),
            is_anonymous: Set(true),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap();

    assert_eq!(repos.galleries.delete("g1").await.unwrap(), 1);

    assert!(repos.images.find_by_id("i1").await.unwrap().is_none());
    assert_eq!(repos.likes.count_by_image("i1").await.unwrap(), 0);
    assert_eq!(repos.comments.count_by_image("i1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_like_is_conflict() {
    let repos = setup().await;
    seed_gallery(&repos, "g1").await;
    repos
        .images
        .create_many(&[image_row("i1", "g1")])
        .await
        .unwrap();

    repos.likes.create(like("l1", "i1", "tok")).await.unwrap();
    let second = repos.likes.create(like("l2", "i1", "tok")).await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert_eq!(repos.likes.count_by_image("i1").await.unwrap(), 1);

    // Another voter is fine.
    repos.likes.create(like("l3", "i1", "other")).await.unwrap();
    assert_eq!(repos.likes.count_by_image("i1").await.unwrap(), 2);
}

#[tokio::test]
async fn test_like_on_missing_image_is_not_found() {
    let repos = setup().await;

    let result = repos.likes.create(like("l1", "ghost", "tok")).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_unlike_only_removes_own_like() {
    let repos = setup().await;
    seed_gallery(&repos, "g1").await;
    repos
        .images
        .create_many(&[image_row("i1", "g1")])
        .await
        .unwrap();
    repos.likes.create(like("l1", "i1", "a")).await.unwrap();
    repos.likes.create(like("l2", "i1", "b")).await.unwrap();

    assert_eq!(repos.likes.delete_by_voter("i1", "a").await.unwrap(), 1);
    assert_eq!(repos.likes.delete_by_voter("i1", "a").await.unwrap(), 0);
    assert!(repos.likes.exists("i1", "b").await.unwrap());
    assert_eq!(repos.likes.count_by_image("i1").await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_postgres_connection_and_cleanup() {
    let db = TestDatabase::postgres(&TestDbConfig::default())
        .await
        .unwrap();
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}
