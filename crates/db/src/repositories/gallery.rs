//! Gallery repository.

use std::sync::Arc;

use crate::entities::{Gallery, gallery};
use memento_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};

/// Gallery repository for database operations.
#[derive(Clone)]
pub struct GalleryRepository {
    db: Arc<DatabaseConnection>,
}

impl GalleryRepository {
    /// Create a new gallery repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a gallery by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<gallery::Model>> {
        Gallery::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a gallery by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<gallery::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Gallery: {id}")))
    }

    /// Find every gallery, most recent first.
    pub async fn find_all(&self) -> AppResult<Vec<gallery::Model>> {
        Gallery::find()
            .order_by_desc(gallery::Column::CreatedAt)
            .order_by_desc(gallery::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new gallery.
    pub async fn create(&self, model: gallery::ActiveModel) -> AppResult<gallery::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a gallery. Images, comments and likes go with it through the
    /// foreign-key cascade. Returns the number of gallery rows removed.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Gallery::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
