//! The upload pipeline: validate, create a tracking record, move the
//! bytes into blob storage, and drive the record to a terminal status.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::policy;
use crate::storage::models::{NewUpload, TabCategory, UploadRecord, UploadStatus};
use crate::storage::{Database, DatabaseError};

/// An inbound file handed to the coordinator.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// Events emitted while a submission runs. The last event is always one
/// of Rejected, Completed, or Failed; Progress values are non-decreasing.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// The file failed category validation. No record was created.
    Rejected { file_name: String, reason: String },
    /// A record was created and the transfer is starting.
    Started(UploadRecord),
    Progress { id: String, percent: u8 },
    Completed(UploadRecord),
    Failed { id: Option<String>, message: String },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{file_name} is not an accepted file type for the {category} category")]
    Rejected {
        file_name: String,
        category: TabCategory,
    },
    #[error("failed to create upload record: {source}")]
    RecordCreate {
        #[source]
        source: DatabaseError,
    },
    #[error("storage write failed for upload {id}: {source}")]
    StorageWrite {
        id: String,
        #[source]
        source: ObjectStoreError,
    },
    #[error("failed to update upload record {id}: {source}")]
    RecordUpdate {
        id: String,
        #[source]
        source: DatabaseError,
    },
}

impl UploadError {
    /// The record id the failure is attached to, when one exists.
    pub fn record_id(&self) -> Option<&str> {
        match self {
            UploadError::Rejected { .. } | UploadError::RecordCreate { .. } => None,
            UploadError::StorageWrite { id, .. } | UploadError::RecordUpdate { id, .. } => {
                Some(id)
            }
        }
    }
}

/// Orchestrates one file's journey through the upload state machine.
/// Cheap to clone; submissions run as independent tokio tasks sharing
/// only the record and blob stores.
#[derive(Clone)]
pub struct UploadCoordinator {
    db: Database,
    store: Arc<dyn ObjectStore>,
}

impl UploadCoordinator {
    pub fn new(db: Database, store: Arc<dyn ObjectStore>) -> Self {
        Self { db, store }
    }

    /// Submit a file for upload. Returns a stream of events ending in a
    /// terminal Rejected, Completed, or Failed. The submission runs to a
    /// terminal state even if the receiver is dropped.
    pub fn submit(
        &self,
        file: IncomingFile,
        category: TabCategory,
    ) -> UnboundedReceiver<UploadEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = self.clone();
        tokio::spawn(async move {
            let outcome = coordinator.run(file, category, &tx).await;
            let terminal = match outcome {
                Ok(record) => UploadEvent::Completed(record),
                Err(UploadError::Rejected {
                    ref file_name,
                    category,
                }) => UploadEvent::Rejected {
                    file_name: file_name.clone(),
                    reason: format!("not an accepted file type for the {category} category"),
                },
                Err(e) => UploadEvent::Failed {
                    id: e.record_id().map(|id| id.to_string()),
                    message: e.to_string(),
                },
            };
            let _ = tx.send(terminal);
        });
        rx
    }

    /// Submit a file and wait for the terminal outcome, discarding
    /// intermediate progress.
    pub async fn submit_and_wait(
        &self,
        file: IncomingFile,
        category: TabCategory,
    ) -> Result<UploadRecord, UploadError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = self.run(file, category, &tx).await;
        rx.close();
        result
    }

    async fn run(
        &self,
        file: IncomingFile,
        category: TabCategory,
        events: &UnboundedSender<UploadEvent>,
    ) -> Result<UploadRecord, UploadError> {
        // 1. Validate. Rejected files are invisible to the store.
        if !policy::accepts(category, &file.file_name, &file.mime_type) {
            tracing::debug!(
                file_name = %file.file_name,
                category = %category,
                "Rejected upload by category policy"
            );
            return Err(UploadError::Rejected {
                file_name: file.file_name,
                category,
            });
        }

        // 2. Create the tracking record (status Uploading, progress 0).
        let record = self
            .db
            .create_upload(NewUpload {
                file_name: file.file_name.clone(),
                file_size: file.data.len() as u64,
                file_type: file.mime_type.clone(),
                tab_category: category,
            })
            .map_err(|source| UploadError::RecordCreate { source })?;
        let id = record.id.clone();
        let _ = events.send(UploadEvent::Started(record));

        // 3. Compute the storage key from the category prefix and the
        // file name's suffix.
        let storage_path = storage_key(category, &id, &file.file_name);

        // 4. Move to Processing before the blob write begins.
        if let Err(source) = self.db.set_status(&id, UploadStatus::Processing, None) {
            self.mark_error(&id, &source.to_string());
            return Err(UploadError::RecordUpdate { id, source });
        }

        // 5. Write the bytes, forwarding non-decreasing progress.
        let high_water = AtomicU8::new(0);
        let progress_tx = events.clone();
        let progress_id = id.clone();
        let on_progress = move |percent: u8| {
            let percent = percent.min(100);
            if percent >= high_water.fetch_max(percent, Ordering::Relaxed) {
                let _ = progress_tx.send(UploadEvent::Progress {
                    id: progress_id.clone(),
                    percent,
                });
            }
        };
        if let Err(source) = self.store.put(&storage_path, file.data, &on_progress).await {
            // 6. Durable error record; no storage_path, no retry.
            self.mark_error(&id, &format!("Storage error: {source}"));
            return Err(UploadError::StorageWrite { id, source });
        }

        // 7. Persist the storage path, then finalize. A failure here is
        // logged and surfaced, but the written blob stays.
        if let Err(source) = self.db.set_storage_path(&id, &storage_path) {
            tracing::warn!(upload_id = %id, error = %source, "Blob written but storage path update failed");
            return Err(UploadError::RecordUpdate { id, source });
        }
        let record = match self.db.set_status(&id, UploadStatus::Complete, None) {
            Ok(record) => record,
            Err(source) => {
                tracing::warn!(upload_id = %id, error = %source, "Blob written but completion update failed");
                return Err(UploadError::RecordUpdate { id, source });
            }
        };

        tracing::debug!(upload_id = %id, path = %storage_path, "Upload complete");
        Ok(record)
    }

    /// Best-effort transition to Error. A store failure at this point is
    /// only logged; the original failure is what gets surfaced.
    fn mark_error(&self, id: &str, message: &str) {
        if let Err(e) = self.db.set_status(id, UploadStatus::Error, Some(message)) {
            tracing::warn!(upload_id = %id, error = %e, "Failed to persist error status");
        }
    }
}

/// Storage key layout: `{category}/{id}.{extension}`. The extension is
/// the file name's suffix reduced to ASCII alphanumerics, or `bin` when
/// the name has none.
fn storage_key(category: TabCategory, id: &str, file_name: &str) -> String {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            ext.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "bin".to_string());
    format!("{category}/{id}.{extension}")
}
