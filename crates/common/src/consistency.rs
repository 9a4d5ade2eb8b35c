//! Partial-failure reports for operations spanning the record store and the
//! object store.
//!
//! Neither store participates in a transaction with the other, so a
//! multi-step operation can stop half way. These types describe what was left
//! behind so a caller can decide whether to retry or clean up by hand.

use serde::Serialize;

/// Which side of a per-file upload failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureStage {
    /// The object could not be stored. Nothing was left behind.
    Store,
    /// The object was stored but its image record could not be inserted.
    Record,
}

/// A single file that did not end up as a paired object + record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    /// Client-supplied file name.
    pub file_name: String,
    /// Step that failed.
    pub stage: FailureStage,
    /// Storage path, when one was assigned.
    pub path: Option<String>,
    /// Error message from the failing store.
    pub message: String,
}

impl FileFailure {
    /// The object stored for this file, if it is now orphaned.
    #[must_use]
    pub fn orphaned_path(&self) -> Option<&str> {
        match self.stage {
            FailureStage::Record => self.path.as_deref(),
            FailureStage::Store => None,
        }
    }
}

/// A batch upload that paired fewer objects with records than it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialUpload {
    /// Gallery the files were uploaded into. It exists.
    pub gallery_id: String,
    /// Number of files submitted.
    pub total: usize,
    /// Number of files that ended with both an object and a record.
    pub succeeded: usize,
    /// Ids of the image records that were created.
    pub image_ids: Vec<String>,
    /// Objects that were stored but have no image record.
    pub orphaned_paths: Vec<String>,
    /// Per-file failures, in submission order.
    pub failures: Vec<FileFailure>,
    /// Files never attempted because an earlier store failed.
    pub skipped: usize,
}

/// Which direction a delete left the two stores out of step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InconsistencyKind {
    /// Record removed, object still stored (`present-object-only`).
    OrphanedObject,
    /// Object removed (or deletion attempted), record still present
    /// (`present-record-only`).
    DanglingRecord,
}

/// A delete that completed on one store but not the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InconsistencyWarning {
    /// Direction of the mismatch.
    pub kind: InconsistencyKind,
    /// Record the warning is about (image or gallery id).
    pub record_id: String,
    /// Storage paths involved.
    pub paths: Vec<String>,
    /// Error message from the failing store.
    pub detail: String,
}

impl std::fmt::Display for InconsistencyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            InconsistencyKind::OrphanedObject => write!(
                f,
                "record {} deleted but {} stored object(s) remain: {}",
                self.record_id,
                self.paths.len(),
                self.detail
            ),
            InconsistencyKind::DanglingRecord => write!(
                f,
                "record {} still present after its object was deleted: {}",
                self.record_id, self.detail
            ),
        }
    }
}
