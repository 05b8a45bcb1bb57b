//! Bulk delete and archive over sets of upload ids. Partial failures
//! never abort the remainder; outcomes name what was and was not done.

use std::sync::Arc;

use serde::Serialize;

use crate::object_store::ObjectStore;
use crate::storage::models::UploadStatus;
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Default, Serialize)]
pub struct BulkDeleteOutcome {
    /// Ids whose records (and blobs, best-effort) were removed.
    pub deleted: Vec<String>,
    /// Ids that did not resolve to a record.
    pub missing: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct BulkArchiveOutcome {
    pub archived: Vec<String>,
    /// Ids skipped because the record was missing or not yet Complete.
    pub skipped: Vec<String>,
}

#[derive(Clone)]
pub struct BulkOperationExecutor {
    db: Database,
    store: Arc<dyn ObjectStore>,
}

impl BulkOperationExecutor {
    pub fn new(db: Database, store: Arc<dyn ObjectStore>) -> Self {
        Self { db, store }
    }

    /// Delete the given uploads: blobs first (best-effort, failures are
    /// logged and never block the record delete), then all records in
    /// one store operation. An empty id set is a no-op.
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<BulkDeleteOutcome, DatabaseError> {
        if ids.is_empty() {
            return Ok(BulkDeleteOutcome::default());
        }

        let mut outcome = BulkDeleteOutcome::default();
        let mut found = Vec::new();
        for id in ids {
            match self.db.get_upload(id)? {
                Some(record) => found.push(record),
                None => outcome.missing.push(id.clone()),
            }
        }

        for record in &found {
            if let Some(ref path) = record.storage_path {
                if let Err(e) = self.store.delete(path).await {
                    tracing::warn!(upload_id = %record.id, path = %path, error = %e,
                        "Failed to delete blob during bulk delete");
                }
            }
        }

        let found_ids: Vec<String> = found.into_iter().map(|r| r.id).collect();
        outcome.deleted = self.db.bulk_delete_uploads(&found_ids)?;

        tracing::debug!(
            deleted = outcome.deleted.len(),
            missing = outcome.missing.len(),
            "Bulk delete finished"
        );
        Ok(outcome)
    }

    /// Archive the given uploads in one store operation. The same
    /// eligibility rule as single-record archive applies: only Complete
    /// records are archived, everything else lands in `skipped`. An
    /// empty id set is a no-op.
    pub async fn bulk_archive(&self, ids: &[String]) -> Result<BulkArchiveOutcome, DatabaseError> {
        if ids.is_empty() {
            return Ok(BulkArchiveOutcome::default());
        }

        let mut outcome = BulkArchiveOutcome::default();
        let mut eligible = Vec::new();
        for id in ids {
            match self.db.get_upload(id)? {
                Some(record) if record.status == UploadStatus::Complete => {
                    eligible.push(id.clone())
                }
                _ => outcome.skipped.push(id.clone()),
            }
        }

        outcome.archived = self.db.bulk_set_archived(&eligible)?;

        tracing::debug!(
            archived = outcome.archived.len(),
            skipped = outcome.skipped.len(),
            "Bulk archive finished"
        );
        Ok(outcome)
    }
}
