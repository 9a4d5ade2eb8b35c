//! Gallery endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use memento_common::{AppError, AppResult};
use memento_core::{AppendOutcome, CreatedGallery, DeleteGalleryOutcome, FilePayload};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{middleware::AppState, response::ApiResponse};

/// Request to delete a gallery.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGalleryRequest {
    pub gallery_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_gallery))
        .route("/append", post(append_images))
        .route("/delete", post(delete_gallery))
}

/// Fields of an upload form.
#[derive(Default)]
struct UploadForm {
    uploader_name: Option<String>,
    gallery_id: Option<String>,
    files: Vec<FilePayload>,
}

/// Read an upload form. Every `file` part becomes one payload, in order.
async fn read_upload(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" | "files" => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec();
                form.files.push(FilePayload {
                    file_name,
                    content_type,
                    data,
                });
            }
            "uploaderName" => {
                form.uploader_name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "galleryId" => {
                form.gallery_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Create a gallery from an upload form.
async fn create_gallery(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<CreatedGallery>> {
    let form = read_upload(multipart).await?;
    let uploader_name = form.uploader_name.unwrap_or_default();
    debug!(files = form.files.len(), "Gallery upload received");

    let created = state
        .gallery_service
        .create_gallery(&uploader_name, form.files)
        .await?;
    Ok(ApiResponse::ok(created))
}

/// Add images to a gallery from an upload form.
async fn append_images(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<AppendOutcome>> {
    let form = read_upload(multipart).await?;
    let gallery_id = form
        .gallery_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("galleryId is required".to_string()))?;

    let outcome = state
        .gallery_service
        .append_images(&gallery_id, form.files)
        .await?;

    if let Some(report) = outcome.partial_report() {
        warn!(
            gallery_id = %report.gallery_id,
            succeeded = report.succeeded,
            total = report.total,
            "Append answered with a partial report"
        );
        return Err(report.into());
    }
    Ok(ApiResponse::ok(outcome))
}

/// Delete a gallery and everything in it.
async fn delete_gallery(
    State(state): State<AppState>,
    Json(req): Json<DeleteGalleryRequest>,
) -> AppResult<ApiResponse<DeleteGalleryOutcome>> {
    let outcome = state.gallery_service.delete_gallery(&req.gallery_id).await?;
    let warning = outcome.warning.clone();
    Ok(ApiResponse::with_warning(outcome, warning))
}
