//! Media lifecycle: creating galleries, adding and removing images.
//!
//! Image bytes live in the object store and image records in the database.
//! Neither store can roll the other back, so every operation here is a fixed
//! sequence of steps that reports what it left behind when a step fails.
//! Where there is a choice, an object without a record is preferred over a
//! record pointing at nothing.

use chrono::Utc;
use futures::{StreamExt, future::join_all, stream};
use memento_common::{
    AppError, AppResult, FailureStage, FileFailure, IdGenerator, InconsistencyKind,
    InconsistencyWarning, PartialUpload, SharedStorage, config::MediaConfig,
    generate_storage_key,
};
use memento_db::{
    entities::{gallery, image},
    repositories::{GalleryRepository, ImageRepository},
};
use sea_orm::{Set, prelude::DateTimeWithTimeZone};
use serde::Serialize;
use validator::Validate;

use super::refresh::RefreshTrigger;

/// Content type used when the client sent none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct FilePayload {
    /// Client-supplied file name. Only its extension is kept.
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FilePayload {
    fn content_type(&self) -> &str {
        if self.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            &self.content_type
        }
    }
}

/// Uploader fields of a new gallery, after trimming.
#[derive(Debug, Validate)]
struct NewGallery {
    /// Bounded by the `uploader_name` column width.
    #[validate(length(min = 1, max = 256))]
    uploader_name: String,
}

/// A gallery whose files were all stored and recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGallery {
    pub gallery: gallery::Model,
    pub images: Vec<image::Model>,
}

/// Result of adding files to an existing gallery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    pub gallery_id: String,
    /// Number of files submitted.
    pub total: usize,
    /// Images stored and recorded, in submission order.
    pub images: Vec<image::Model>,
    /// Files that did not make it, in submission order.
    pub failures: Vec<FileFailure>,
}

impl AppendOutcome {
    /// Whether every file ended up stored and recorded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Partial-failure report, when any file failed.
    #[must_use]
    pub fn partial_report(&self) -> Option<PartialUpload> {
        if self.is_complete() {
            return None;
        }

        Some(PartialUpload {
            gallery_id: self.gallery_id.clone(),
            total: self.total,
            succeeded: self.images.len(),
            image_ids: self.images.iter().map(|i| i.id.clone()).collect(),
            orphaned_paths: self
                .failures
                .iter()
                .filter_map(FileFailure::orphaned_path)
                .map(str::to_string)
                .collect(),
            failures: self.failures.clone(),
            skipped: 0,
        })
    }
}

/// Result of deleting one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "warning", rename_all = "camelCase")]
pub enum DeleteImageOutcome {
    /// Object and record are both gone.
    Clean,
    /// The record is gone but the object could not be deleted.
    ObjectRetained(InconsistencyWarning),
    /// The object delete was issued but the record is still present.
    RecordRetained(InconsistencyWarning),
}

impl DeleteImageOutcome {
    /// The warning carried by a partial delete.
    #[must_use]
    pub const fn warning(&self) -> Option<&InconsistencyWarning> {
        match self {
            Self::Clean => None,
            Self::ObjectRetained(w) | Self::RecordRetained(w) => Some(w),
        }
    }
}

/// Result of deleting a gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGalleryOutcome {
    pub gallery_id: String,
    /// Storage paths handed to the batch object delete.
    pub removed_paths: Vec<String>,
    /// Set when the object delete failed and the objects remain stored.
    pub warning: Option<InconsistencyWarning>,
}

/// Owns the pairing between stored objects and image records.
#[derive(Clone)]
pub struct GalleryService {
    gallery_repo: GalleryRepository,
    image_repo: ImageRepository,
    storage: SharedStorage,
    refresh: RefreshTrigger,
    id_gen: IdGenerator,
    upload_concurrency: usize,
    max_files: usize,
}

impl GalleryService {
    /// Create a new gallery service.
    #[must_use]
    pub fn new(
        gallery_repo: GalleryRepository,
        image_repo: ImageRepository,
        storage: SharedStorage,
        refresh: RefreshTrigger,
        media: &MediaConfig,
    ) -> Self {
        Self {
            gallery_repo,
            image_repo,
            storage,
            refresh,
            id_gen: IdGenerator::new(),
            upload_concurrency: media.upload_concurrency.max(1),
            max_files: media.max_files_per_upload,
        }
    }

    /// Create a gallery and upload its first images.
    ///
    /// The gallery row is written first. Files are then stored in waves of
    /// at most `upload_concurrency`; after a wave with a storage failure no
    /// further files are sent. Whatever was stored is recorded with a single
    /// batch insert. Anything short of all files paired comes back as
    /// [`AppError::PartialUpload`]; the gallery is kept either way.
    pub async fn create_gallery(
        &self,
        uploader_name: &str,
        files: Vec<FilePayload>,
    ) -> AppResult<CreatedGallery> {
        let input = NewGallery {
            uploader_name: uploader_name.trim().to_string(),
        };
        input.validate()?;
        self.check_batch(&files)?;

        let gallery = self
            .gallery_repo
            .create(gallery::ActiveModel {
                id: Set(self.id_gen.generate()),
                uploader_name: Set(input.uploader_name),
                created_at: Set(Utc::now().into()),
            })
            .await?;
        let gallery_id = gallery.id.clone();

        tracing::info!(gallery_id = %gallery_id, files = files.len(), "Gallery created");

        let total = files.len();
        let mut stored: Vec<(usize, String)> = Vec::with_capacity(total);
        let mut failures: Vec<(usize, FileFailure)> = Vec::new();
        let mut attempted = 0;

        for wave in files.chunks(self.upload_concurrency) {
            let first = attempted;
            let results = join_all(wave.iter().map(|f| self.store_object(&gallery_id, f))).await;
            attempted += wave.len();

            for (offset, result) in results.into_iter().enumerate() {
                match result {
                    Ok(path) => stored.push((first + offset, path)),
                    Err(failure) => failures.push((first + offset, failure)),
                }
            }

            if !failures.is_empty() {
                tracing::warn!(
                    gallery_id = %gallery_id,
                    skipped = total - attempted,
                    "Storage failed, remaining files not uploaded"
                );
                break;
            }
        }

        let created_at: DateTimeWithTimeZone = Utc::now().into();
        let rows: Vec<image::Model> = stored
            .iter()
            .map(|(_, path)| image::Model {
                id: self.id_gen.generate(),
                gallery_id: gallery_id.clone(),
                image_url: self.storage.public_url(path),
                file_path: path.clone(),
                created_at,
            })
            .collect();

        let mut orphaned_paths = Vec::new();
        let images = match self.image_repo.create_many(&rows).await {
            Ok(()) => rows,
            Err(e) => {
                tracing::warn!(
                    gallery_id = %gallery_id,
                    orphaned = stored.len(),
                    error = %e,
                    "Image records not written, stored objects are orphaned"
                );
                for (index, path) in stored {
                    failures.push((
                        index,
                        FileFailure {
                            file_name: files[index].file_name.clone(),
                            stage: FailureStage::Record,
                            path: Some(path.clone()),
                            message: e.to_string(),
                        },
                    ));
                    orphaned_paths.push(path);
                }
                Vec::new()
            }
        };

        self.refresh.bump();

        if images.len() == total {
            tracing::info!(gallery_id = %gallery_id, images = total, "Gallery upload complete");
            return Ok(CreatedGallery { gallery, images });
        }

        failures.sort_by_key(|(index, _)| *index);
        let report = PartialUpload {
            gallery_id,
            total,
            succeeded: images.len(),
            image_ids: images.iter().map(|i| i.id.clone()).collect(),
            orphaned_paths,
            failures: failures.into_iter().map(|(_, f)| f).collect(),
            skipped: total - attempted,
        };
        tracing::warn!(
            gallery_id = %report.gallery_id,
            succeeded = report.succeeded,
            total,
            "Gallery upload incomplete"
        );
        Err(report.into())
    }

    /// Add images to an existing gallery.
    ///
    /// Each file is stored and recorded on its own, up to
    /// `upload_concurrency` at a time. A failing file does not stop the
    /// others; its failure is listed in the outcome.
    pub async fn append_images(
        &self,
        gallery_id: &str,
        files: Vec<FilePayload>,
    ) -> AppResult<AppendOutcome> {
        self.check_batch(&files)?;
        self.gallery_repo.get_by_id(gallery_id).await?;

        // Futures are lazy: building them all up front dispatches nothing.
        let pending: Vec<_> = files
            .iter()
            .map(|file| self.append_one(gallery_id, file))
            .collect();
        let results: Vec<Result<image::Model, FileFailure>> = stream::iter(pending)
            .buffered(self.upload_concurrency)
            .collect()
            .await;

        let total = results.len();
        let mut images = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(image) => images.push(image),
                Err(failure) => failures.push(failure),
            }
        }

        if !images.is_empty() {
            self.refresh.bump();
        }

        if failures.is_empty() {
            tracing::info!(gallery_id = %gallery_id, images = total, "Images appended");
        } else {
            tracing::warn!(
                gallery_id = %gallery_id,
                succeeded = images.len(),
                failed = failures.len(),
                "Append incomplete"
            );
        }

        Ok(AppendOutcome {
            gallery_id: gallery_id.to_string(),
            total,
            images,
            failures,
        })
    }

    /// Delete one image: the object first, then the record.
    ///
    /// Both deletes are always attempted. If exactly one fails the outcome
    /// carries a warning; if both fail nothing changed and the error is
    /// returned for the caller to retry. A record delete that matches no row
    /// is [`AppError::NotFound`], even though the object delete was issued.
    pub async fn delete_image(&self, image_id: &str, path: &str) -> AppResult<DeleteImageOutcome> {
        let paths = vec![path.to_string()];
        let object = self.storage.delete_many(&paths).await;
        let record = self.image_repo.delete(image_id).await;

        if matches!(record, Ok(0)) {
            tracing::warn!(
                image_id = %image_id,
                path = %path,
                object_deleted = object.is_ok(),
                "No image record to delete"
            );
            return Err(AppError::NotFound(format!("Image: {image_id}")));
        }

        let outcome = match (object, record) {
            (Ok(()), Ok(_)) => DeleteImageOutcome::Clean,
            (Err(e), Ok(_)) => DeleteImageOutcome::ObjectRetained(InconsistencyWarning {
                kind: InconsistencyKind::OrphanedObject,
                record_id: image_id.to_string(),
                paths,
                detail: e.to_string(),
            }),
            (Ok(()), Err(e)) => DeleteImageOutcome::RecordRetained(InconsistencyWarning {
                kind: InconsistencyKind::DanglingRecord,
                record_id: image_id.to_string(),
                paths,
                detail: e.to_string(),
            }),
            (Err(object_err), Err(record_err)) => {
                tracing::error!(
                    image_id = %image_id,
                    path = %path,
                    storage_error = %object_err,
                    database_error = %record_err,
                    "Image delete failed on both stores"
                );
                return Err(AppError::Database(format!(
                    "Image {image_id} not deleted: {record_err}; object delete also failed: {object_err}"
                )));
            }
        };

        match outcome.warning() {
            None => tracing::info!(image_id = %image_id, path = %path, "Image deleted"),
            Some(warning) => {
                tracing::warn!(image_id = %image_id, path = %path, warning = %warning, "Image partially deleted");
            }
        }

        self.refresh.bump();
        Ok(outcome)
    }

    /// Delete an image, looking its storage path up from the record.
    pub async fn delete_image_by_id(&self, image_id: &str) -> AppResult<DeleteImageOutcome> {
        let image = self.image_repo.get_by_id(image_id).await?;
        self.delete_image(&image.id, &image.file_path).await
    }

    /// Delete a gallery with all of its images.
    ///
    /// The stored objects are removed with one batch delete, then the
    /// gallery row is deleted and the database cascades to images, comments
    /// and likes. A failed object delete is reported but does not stop the
    /// row delete.
    pub async fn delete_gallery(&self, gallery_id: &str) -> AppResult<DeleteGalleryOutcome> {
        self.gallery_repo.get_by_id(gallery_id).await?;
        let paths = self.image_repo.find_paths_by_gallery(gallery_id).await?;

        let warning = if paths.is_empty() {
            None
        } else {
            match self.storage.delete_many(&paths).await {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(
                        gallery_id = %gallery_id,
                        objects = paths.len(),
                        error = %e,
                        "Object delete failed, continuing with gallery delete"
                    );
                    Some(InconsistencyWarning {
                        kind: InconsistencyKind::OrphanedObject,
                        record_id: gallery_id.to_string(),
                        paths: paths.clone(),
                        detail: e.to_string(),
                    })
                }
            }
        };

        self.gallery_repo.delete(gallery_id).await?;
        self.refresh.bump();

        tracing::info!(gallery_id = %gallery_id, objects = paths.len(), "Gallery deleted");

        Ok(DeleteGalleryOutcome {
            gallery_id: gallery_id.to_string(),
            removed_paths: paths,
            warning,
        })
    }

    fn check_batch(&self, files: &[FilePayload]) -> AppResult<()> {
        if files.is_empty() {
            return Err(AppError::Validation(
                "At least one file is required".to_string(),
            ));
        }
        if files.len() > self.max_files {
            return Err(AppError::Validation(format!(
                "Maximum of {} files allowed per upload",
                self.max_files
            )));
        }
        Ok(())
    }

    async fn store_object(&self, gallery_id: &str, file: &FilePayload) -> Result<String, FileFailure> {
        let path = generate_storage_key(gallery_id, &file.file_name);

        match self
            .storage
            .put(&path, &file.data, file.content_type())
            .await
        {
            Ok(stored) => {
                tracing::debug!(
                    gallery_id = %gallery_id,
                    path = %stored.key,
                    size = stored.size,
                    md5 = %stored.md5,
                    "Object stored"
                );
                Ok(path)
            }
            Err(e) => {
                tracing::warn!(gallery_id = %gallery_id, path = %path, error = %e, "Object store failed");
                Err(FileFailure {
                    file_name: file.file_name.clone(),
                    stage: FailureStage::Store,
                    path: Some(path),
                    message: e.to_string(),
                })
            }
        }
    }

    async fn append_one(
        &self,
        gallery_id: &str,
        file: &FilePayload,
    ) -> Result<image::Model, FileFailure> {
        let path = self.store_object(gallery_id, file).await?;

        let model = image::ActiveModel {
            id: Set(self.id_gen.generate()),
            gallery_id: Set(gallery_id.to_string()),
            image_url: Set(self.storage.public_url(&path)),
            file_path: Set(path.clone()),
            created_at: Set(Utc::now().into()),
        };

        self.image_repo.create(model).await.map_err(|e| {
            tracing::warn!(gallery_id = %gallery_id, path = %path, error = %e, "Image record not written, object orphaned");
            FileFailure {
                file_name: file.file_name.clone(),
                stage: FailureStage::Record,
                path: Some(path),
                message: e.to_string(),
            }
        })
    }
}
