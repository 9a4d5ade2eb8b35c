//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use memento_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Comments on an image, most recent first.
    pub async fn find_by_image(&self, image_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::ImageId.eq(image_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on an image.
    pub async fn count_by_image(&self, image_id: &str) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::ImageId.eq(image_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_error(&e))
    }
}

fn map_insert_error(err: &DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("Image: no such image to comment on".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}
