use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{
    ListFilter, NewUpload, SortBy, SortOrder, TabCategory, UploadMetadata, UploadRecord,
    UploadStatus,
};
use super::tables::*;

impl Database {
    // ========================================================================
    // Upload record operations
    // ========================================================================

    /// Create a new upload record. The store assigns the id and stamps the
    /// timestamps; the record starts at status Uploading with progress 0.
    pub fn create_upload(&self, new: NewUpload) -> Result<UploadRecord, DatabaseError> {
        let now = Utc::now();
        let record = UploadRecord {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: new.file_name.clone(),
            file_size: new.file_size,
            file_type: new.file_type,
            tab_category: new.tab_category,
            status: UploadStatus::Uploading,
            storage_path: None,
            metadata: UploadMetadata {
                original_name: new.file_name,
                progress: 0,
                upload_timestamp: now,
            },
            error_message: None,
            uploaded_at: now,
            processed_at: None,
            archived: false,
            archived_at: None,
        };

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(UPLOADS)?;
            let data = rmp_serde::to_vec_named(&record)?;
            table.insert(record.id.as_str(), data.as_slice())?;

            // Maintain category index
            let mut index = write_txn.open_table(CATEGORY_UPLOADS)?;
            let category = record.tab_category.as_str();
            let mut ids: Vec<String> = index
                .get(category)?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();
            if !ids.contains(&record.id) {
                ids.push(record.id.clone());
                let index_data = rmp_serde::to_vec_named(&ids)?;
                index.insert(category, index_data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(record)
    }

    /// Get an upload by its UUID
    pub fn get_upload(&self, id: &str) -> Result<Option<UploadRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(UPLOADS)?;

        match table.get(id)? {
            Some(data) => {
                let record: UploadRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Get all uploads
    pub fn get_all_uploads(&self) -> Result<Vec<UploadRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(UPLOADS)?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let record: UploadRecord = rmp_serde::from_slice(value.value())?;
            records.push(record);
        }

        Ok(records)
    }

    /// Get all uploads for a category, via the category index
    pub fn get_uploads_by_category(
        &self,
        category: TabCategory,
    ) -> Result<Vec<UploadRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(CATEGORY_UPLOADS)?;
        let uploads_table = read_txn.open_table(UPLOADS)?;

        let ids: Vec<String> = match index.get(category.as_str())? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut records = Vec::new();
        for id in ids {
            if let Some(data) = uploads_table.get(id.as_str())? {
                let record: UploadRecord = rmp_serde::from_slice(data.value())?;
                records.push(record);
            }
        }

        Ok(records)
    }

    /// List uploads with filtering, search, sorting, and an optional limit
    pub fn list_uploads(&self, filter: &ListFilter) -> Result<Vec<UploadRecord>, DatabaseError> {
        // Use the category index when a category is given
        let mut records = match filter.category {
            Some(category) => self.get_uploads_by_category(category)?,
            None => self.get_all_uploads()?,
        };

        if let Some(status) = filter.status {
            records.retain(|r| r.status == status);
        }

        if let Some(archived) = filter.archived {
            records.retain(|r| r.archived == archived);
        }

        if let Some(ref search) = filter.search {
            let needle = search.to_lowercase();
            records.retain(|r| {
                r.file_name.to_lowercase().contains(&needle)
                    || r.metadata.original_name.to_lowercase().contains(&needle)
            });
        }

        match filter.sort_by {
            SortBy::UploadedAt => records.sort_by_key(|r| r.uploaded_at),
            SortBy::FileName => records.sort_by(|a, b| {
                a.file_name
                    .to_lowercase()
                    .cmp(&b.file_name.to_lowercase())
            }),
            SortBy::FileSize => records.sort_by_key(|r| r.file_size),
            SortBy::ProcessedAt => records.sort_by_key(|r| r.processed_at),
        }
        if filter.sort_order == SortOrder::Desc {
            records.reverse();
        }

        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }

        Ok(records)
    }

    /// Transition an upload's status. Illegal transitions are rejected;
    /// moving to Complete stamps processed_at and sets progress to 100,
    /// moving to Error stores the message.
    pub fn set_status(
        &self,
        id: &str,
        status: UploadStatus,
        error_message: Option<&str>,
    ) -> Result<UploadRecord, DatabaseError> {
        let write_txn = self.begin_write()?;

        let updated = {
            let mut table = write_txn.open_table(UPLOADS)?;
            let mut record: UploadRecord = match table.get(id)? {
                Some(data) => rmp_serde::from_slice(data.value())?,
                None => return Err(DatabaseError::NotFound(id.to_string())),
            };

            if !record.status.allows(status) {
                return Err(DatabaseError::InvalidTransition {
                    from: record.status,
                    to: status,
                });
            }

            record.status = status;
            match status {
                UploadStatus::Complete => {
                    record.processed_at = Some(Utc::now());
                    record.metadata.progress = 100;
                }
                UploadStatus::Error => {
                    record.error_message = error_message.map(|s| s.to_string());
                }
                _ => {}
            }

            let data = rmp_serde::to_vec_named(&record)?;
            table.insert(id, data.as_slice())?;
            record
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Record the storage path once the blob write has succeeded
    pub fn set_storage_path(&self, id: &str, path: &str) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(UPLOADS)?;
            let mut record: UploadRecord = match table.get(id)? {
                Some(data) => rmp_serde::from_slice(data.value())?,
                None => return Err(DatabaseError::NotFound(id.to_string())),
            };

            record.storage_path = Some(path.to_string());
            let data = rmp_serde::to_vec_named(&record)?;
            table.insert(id, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Set or clear the archive flag. Archiving stamps archived_at,
    /// unarchiving clears it. Returns None when the record does not exist.
    pub fn set_archived(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<Option<UploadRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let updated = {
            let mut table = write_txn.open_table(UPLOADS)?;
            let record: Option<UploadRecord> = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            match record {
                Some(mut record) => {
                    record.archived = archived;
                    record.archived_at = if archived { Some(Utc::now()) } else { None };
                    let data = rmp_serde::to_vec_named(&record)?;
                    table.insert(id, data.as_slice())?;
                    Some(record)
                }
                None => None,
            }
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Archive many uploads in one write transaction. Unknown ids are
    /// skipped; returns the ids actually updated.
    pub fn bulk_set_archived(&self, ids: &[String]) -> Result<Vec<String>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let write_txn = self.begin_write()?;
        let mut updated = Vec::new();
        {
            let mut table = write_txn.open_table(UPLOADS)?;
            let now = Utc::now();
            for id in ids {
                let record: Option<UploadRecord> = match table.get(id.as_str())? {
                    Some(data) => Some(rmp_serde::from_slice(data.value())?),
                    None => None,
                };
                if let Some(mut record) = record {
                    record.archived = true;
                    record.archived_at = Some(now);
                    let data = rmp_serde::to_vec_named(&record)?;
                    table.insert(id.as_str(), data.as_slice())?;
                    updated.push(id.clone());
                }
            }
        }
        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete an upload and clean up the category index. Returns the
    /// removed record, or None when it did not exist.
    pub fn delete_upload(&self, id: &str) -> Result<Option<UploadRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let removed = {
            let mut table = write_txn.open_table(UPLOADS)?;
            let record: Option<UploadRecord> = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            if let Some(ref record) = record {
                table.remove(id)?;
                drop(table);
                Self::remove_from_category_index(&write_txn, record.tab_category, &[id])?;
            }
            record
        };

        write_txn.commit()?;
        Ok(removed)
    }

    /// Delete many uploads in one write transaction. Unknown ids are
    /// skipped; returns the ids actually removed.
    pub fn bulk_delete_uploads(&self, ids: &[String]) -> Result<Vec<String>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let write_txn = self.begin_write()?;
        let mut deleted: Vec<(String, TabCategory)> = Vec::new();
        {
            let mut table = write_txn.open_table(UPLOADS)?;
            for id in ids {
                let record: Option<UploadRecord> = match table.get(id.as_str())? {
                    Some(data) => Some(rmp_serde::from_slice(data.value())?),
                    None => None,
                };
                if let Some(record) = record {
                    table.remove(id.as_str())?;
                    deleted.push((id.clone(), record.tab_category));
                }
            }
        }

        for category in TabCategory::ALL {
            let removed: Vec<&str> = deleted
                .iter()
                .filter(|(_, c)| *c == category)
                .map(|(id, _)| id.as_str())
                .collect();
            if !removed.is_empty() {
                Self::remove_from_category_index(&write_txn, category, &removed)?;
            }
        }

        write_txn.commit()?;
        Ok(deleted.into_iter().map(|(id, _)| id).collect())
    }

    fn remove_from_category_index(
        write_txn: &redb::WriteTransaction,
        category: TabCategory,
        ids: &[&str],
    ) -> Result<(), DatabaseError> {
        let existing: Option<Vec<String>> = {
            let index = write_txn.open_table(CATEGORY_UPLOADS)?;
            let value = match index.get(category.as_str())? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            value
        };

        if let Some(mut remaining) = existing {
            remaining.retain(|existing_id| !ids.contains(&existing_id.as_str()));
            let mut index = write_txn.open_table(CATEGORY_UPLOADS)?;
            if remaining.is_empty() {
                index.remove(category.as_str())?;
            } else {
                let data = rmp_serde::to_vec_named(&remaining)?;
                index.insert(category.as_str(), data.as_slice())?;
            }
        }
        Ok(())
    }
}
