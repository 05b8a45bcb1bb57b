//! Soft delete for completed uploads. Archived records keep their blob
//! and drop out of the default listings.

use thiserror::Error;

use crate::storage::models::{UploadRecord, UploadStatus};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("upload not found: {0}")]
    NotFound(String),
    #[error("only completed uploads can be archived (status is {0})")]
    NotComplete(UploadStatus),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Clone)]
pub struct ArchiveManager {
    db: Database,
}

impl ArchiveManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Archive a completed upload. Rejected without mutation when the
    /// record is missing or not yet Complete.
    pub fn archive(&self, id: &str) -> Result<UploadRecord, ArchiveError> {
        let record = self
            .db
            .get_upload(id)?
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))?;
        if record.status != UploadStatus::Complete {
            return Err(ArchiveError::NotComplete(record.status));
        }

        let record = self
            .db
            .set_archived(id, true)?
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))?;
        tracing::debug!(upload_id = %id, "Archived upload");
        Ok(record)
    }

    /// Restore an archived upload. Idempotent; unarchiving a record that
    /// was never archived is a harmless no-op.
    pub fn unarchive(&self, id: &str) -> Result<UploadRecord, ArchiveError> {
        let record = self
            .db
            .set_archived(id, false)?
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))?;
        tracing::debug!(upload_id = %id, "Unarchived upload");
        Ok(record)
    }
}
