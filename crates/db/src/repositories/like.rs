//! Image like repository.

use std::sync::Arc;

use crate::entities::{ImageLike, image_like};
use memento_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, SqlErr,
};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Count likes on an image.
    pub async fn count_by_image(&self, image_id: &str) -> AppResult<u64> {
        ImageLike::find()
            .filter(image_like::Column::ImageId.eq(image_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether the voter has a like recorded on the image.
    pub async fn exists(&self, image_id: &str, voter_token: &str) -> AppResult<bool> {
        let count = ImageLike::find()
            .filter(image_like::Column::ImageId.eq(image_id))
            .filter(image_like::Column::VoterToken.eq(voter_token))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Record a like.
    ///
    /// A second like from the same voter on the same image is rejected by the
    /// unique index and reported as [`AppError::Conflict`].
    pub async fn create(&self, model: image_like::ActiveModel) -> AppResult<image_like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_error(&e))
    }

    /// Remove the voter's like from an image. Returns the number of rows
    /// removed, zero when there was nothing to remove.
    pub async fn delete_by_voter(&self, image_id: &str, voter_token: &str) -> AppResult<u64> {
        let result = ImageLike::delete_many()
            .filter(image_like::Column::ImageId.eq(image_id))
            .filter(image_like::Column::VoterToken.eq(voter_token))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

fn map_insert_error(err: &DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Image already liked by this voter".to_string())
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("Image: no such image to like".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_count_by_image() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert_eq!(repo.count_by_image("img1").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_exists() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [maplit::btreemap! {
                        "num_items" => sea_orm::Value::BigInt(Some(1))
                    }],
                    [maplit::btreemap! {
                        "num_items" => sea_orm::Value::BigInt(Some(0))
                    }],
                ])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.exists("img1", "tok").await.unwrap());
        assert!(!repo.exists("img1", "other").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_voter_nothing_to_remove() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert_eq!(repo.delete_by_voter("img1", "tok").await.unwrap(), 0);
    }

    #[test]
    fn test_generic_insert_error_maps_to_database() {
        let err = map_insert_error(&DbErr::Custom("broken pipe".to_string()));
        assert!(matches!(err, AppError::Database(_)));
    }
}
