//! Image repository.

use std::sync::Arc;

use crate::entities::{Image, image};
use memento_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// Image repository for database operations.
#[derive(Clone)]
pub struct ImageRepository {
    db: Arc<DatabaseConnection>,
}

impl ImageRepository {
    /// Create a new image repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an image by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<image::Model>> {
        Image::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an image by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<image::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image: {id}")))
    }

    /// Find the images of a gallery, most recent first.
    pub async fn find_by_gallery(&self, gallery_id: &str) -> AppResult<Vec<image::Model>> {
        Image::find()
            .filter(image::Column::GalleryId.eq(gallery_id))
            .order_by_desc(image::Column::CreatedAt)
            .order_by_desc(image::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Storage paths of every image in a gallery.
    pub async fn find_paths_by_gallery(&self, gallery_id: &str) -> AppResult<Vec<String>> {
        Image::find()
            .select_only()
            .column(image::Column::FilePath)
            .filter(image::Column::GalleryId.eq(gallery_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a single image record.
    pub async fn create(&self, model: image::ActiveModel) -> AppResult<image::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert several image records in one statement.
    ///
    /// Either every row is written or none is.
    pub async fn create_many(&self, models: &[image::Model]) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }

        let rows = models.iter().map(|m| image::ActiveModel {
            id: Set(m.id.clone()),
            gallery_id: Set(m.gallery_id.clone()),
            image_url: Set(m.image_url.clone()),
            file_path: Set(m.file_path.clone()),
            created_at: Set(m.created_at),
        });

        Image::insert_many(rows)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Delete an image record. Returns the number of rows removed.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Image::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
