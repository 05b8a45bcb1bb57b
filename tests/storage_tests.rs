use upload_manager::storage::models::{
    ListFilter, NewUpload, SortBy, SortOrder, TabCategory, UploadRecord, UploadStatus,
};
use upload_manager::storage::{Database, DatabaseError};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn new_upload(file_name: &str, size: u64, category: TabCategory) -> NewUpload {
    NewUpload {
        file_name: file_name.to_string(),
        file_size: size,
        file_type: "text/csv".to_string(),
        tab_category: category,
    }
}

/// Drive a fresh record to Complete the way the coordinator does.
fn complete(db: &Database, id: &str) -> UploadRecord {
    db.set_status(id, UploadStatus::Processing, None).unwrap();
    db.set_status(id, UploadStatus::Complete, None).unwrap()
}

#[test]
fn test_create_and_get_upload() {
    let (_dir, db) = test_db();
    let record = db
        .create_upload(new_upload("tracks.csv", 10_000, TabCategory::Catalog))
        .unwrap();

    assert!(!record.id.is_empty());
    assert_eq!(record.file_name, "tracks.csv");
    assert_eq!(record.file_size, 10_000);
    assert_eq!(record.tab_category, TabCategory::Catalog);
    assert_eq!(record.status, UploadStatus::Uploading);
    assert_eq!(record.metadata.progress, 0);
    assert_eq!(record.metadata.original_name, "tracks.csv");
    assert_eq!(record.storage_path, None);
    assert!(!record.archived);

    let retrieved = db.get_upload(&record.id).unwrap().expect("should exist");
    assert_eq!(retrieved.id, record.id);
    assert_eq!(retrieved.file_name, "tracks.csv");
    assert_eq!(retrieved.status, UploadStatus::Uploading);
}

#[test]
fn test_get_upload_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_upload("nonexistent").unwrap().is_none());
}

#[test]
fn test_get_uploads_by_category() {
    let (_dir, db) = test_db();
    db.create_upload(new_upload("a.csv", 1, TabCategory::Catalog))
        .unwrap();
    db.create_upload(new_upload("b.csv", 2, TabCategory::Catalog))
        .unwrap();
    db.create_upload(new_upload("deal.pdf", 3, TabCategory::Agreements))
        .unwrap();

    let catalog = db.get_uploads_by_category(TabCategory::Catalog).unwrap();
    assert_eq!(catalog.len(), 2);

    let agreements = db.get_uploads_by_category(TabCategory::Agreements).unwrap();
    assert_eq!(agreements.len(), 1);
    assert_eq!(agreements[0].file_name, "deal.pdf");

    let royalties = db.get_uploads_by_category(TabCategory::Royalties).unwrap();
    assert!(royalties.is_empty());
}

#[test]
fn test_status_transitions_happy_path() {
    let (_dir, db) = test_db();
    let record = db
        .create_upload(new_upload("tracks.csv", 100, TabCategory::Catalog))
        .unwrap();

    let record = db
        .set_status(&record.id, UploadStatus::Processing, None)
        .unwrap();
    assert_eq!(record.status, UploadStatus::Processing);
    assert!(record.processed_at.is_none());

    let record = db
        .set_status(&record.id, UploadStatus::Complete, None)
        .unwrap();
    assert_eq!(record.status, UploadStatus::Complete);
    assert!(record.processed_at.is_some());
    assert_eq!(record.metadata.progress, 100);
}

#[test]
fn test_status_transition_to_error_keeps_message() {
    let (_dir, db) = test_db();
    let record = db
        .create_upload(new_upload("tracks.csv", 100, TabCategory::Catalog))
        .unwrap();
    db.set_status(&record.id, UploadStatus::Processing, None)
        .unwrap();

    let record = db
        .set_status(&record.id, UploadStatus::Error, Some("Storage error: disk full"))
        .unwrap();
    assert_eq!(record.status, UploadStatus::Error);
    assert_eq!(
        record.error_message.as_deref(),
        Some("Storage error: disk full")
    );
    assert!(record.processed_at.is_none());
}

#[test]
fn test_illegal_status_transitions_rejected() {
    let (_dir, db) = test_db();
    let record = db
        .create_upload(new_upload("tracks.csv", 100, TabCategory::Catalog))
        .unwrap();
    let id = record.id.clone();

    // Uploading cannot jump straight to Complete
    assert!(matches!(
        db.set_status(&id, UploadStatus::Complete, None),
        Err(DatabaseError::InvalidTransition { .. })
    ));

    complete(&db, &id);

    // Terminal states never move
    for next in [
        UploadStatus::Uploading,
        UploadStatus::Processing,
        UploadStatus::Error,
    ] {
        assert!(matches!(
            db.set_status(&id, next, None),
            Err(DatabaseError::InvalidTransition { .. })
        ));
    }

    // The record is unchanged
    let record = db.get_upload(&id).unwrap().unwrap();
    assert_eq!(record.status, UploadStatus::Complete);
}

#[test]
fn test_set_status_not_found() {
    let (_dir, db) = test_db();
    assert!(matches!(
        db.set_status("nonexistent", UploadStatus::Processing, None),
        Err(DatabaseError::NotFound(_))
    ));
}

#[test]
fn test_set_storage_path() {
    let (_dir, db) = test_db();
    let record = db
        .create_upload(new_upload("tracks.csv", 100, TabCategory::Catalog))
        .unwrap();

    let path = format!("catalog/{}.csv", record.id);
    db.set_storage_path(&record.id, &path).unwrap();

    let record = db.get_upload(&record.id).unwrap().unwrap();
    assert_eq!(record.storage_path.as_deref(), Some(path.as_str()));
}

#[test]
fn test_set_archived_round_trip() {
    let (_dir, db) = test_db();
    let record = db
        .create_upload(new_upload("tracks.csv", 100, TabCategory::Catalog))
        .unwrap();

    let archived = db.set_archived(&record.id, true).unwrap().unwrap();
    assert!(archived.archived);
    assert!(archived.archived_at.is_some());

    let restored = db.set_archived(&record.id, false).unwrap().unwrap();
    assert!(!restored.archived);
    assert!(restored.archived_at.is_none());

    assert!(db.set_archived("nonexistent", true).unwrap().is_none());
}

#[test]
fn test_bulk_set_archived_skips_unknown_ids() {
    let (_dir, db) = test_db();
    let a = db
        .create_upload(new_upload("a.csv", 1, TabCategory::Catalog))
        .unwrap();
    let b = db
        .create_upload(new_upload("b.csv", 2, TabCategory::Catalog))
        .unwrap();

    let ids = vec![a.id.clone(), "ghost".to_string(), b.id.clone()];
    let updated = db.bulk_set_archived(&ids).unwrap();
    assert_eq!(updated, vec![a.id.clone(), b.id.clone()]);

    assert!(db.get_upload(&a.id).unwrap().unwrap().archived);
    assert!(db.get_upload(&b.id).unwrap().unwrap().archived);
}

#[test]
fn test_bulk_set_archived_empty_is_noop() {
    let (_dir, db) = test_db();
    assert!(db.bulk_set_archived(&[]).unwrap().is_empty());
}

#[test]
fn test_delete_upload_cleans_category_index() {
    let (_dir, db) = test_db();
    let keep = db
        .create_upload(new_upload("keep.csv", 1, TabCategory::Catalog))
        .unwrap();
    let gone = db
        .create_upload(new_upload("gone.csv", 2, TabCategory::Catalog))
        .unwrap();

    let removed = db.delete_upload(&gone.id).unwrap().expect("should remove");
    assert_eq!(removed.id, gone.id);
    assert!(db.get_upload(&gone.id).unwrap().is_none());

    let remaining = db.get_uploads_by_category(TabCategory::Catalog).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
}

#[test]
fn test_delete_upload_not_found() {
    let (_dir, db) = test_db();
    assert!(db.delete_upload("nonexistent").unwrap().is_none());
}

#[test]
fn test_bulk_delete_uploads() {
    let (_dir, db) = test_db();
    let a = db
        .create_upload(new_upload("a.csv", 1, TabCategory::Catalog))
        .unwrap();
    let b = db
        .create_upload(new_upload("b.pdf", 2, TabCategory::Agreements))
        .unwrap();

    let ids = vec![a.id.clone(), "ghost".to_string(), b.id.clone()];
    let deleted = db.bulk_delete_uploads(&ids).unwrap();
    assert_eq!(deleted.len(), 2);
    assert!(db.get_upload(&a.id).unwrap().is_none());
    assert!(db.get_upload(&b.id).unwrap().is_none());
    assert!(db.get_uploads_by_category(TabCategory::Catalog).unwrap().is_empty());
    assert!(db
        .get_uploads_by_category(TabCategory::Agreements)
        .unwrap()
        .is_empty());

    // Empty set mutates nothing
    assert!(db.bulk_delete_uploads(&[]).unwrap().is_empty());
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_default_hides_archived() {
    let (_dir, db) = test_db();
    let visible = db
        .create_upload(new_upload("visible.csv", 1, TabCategory::Catalog))
        .unwrap();
    let hidden = db
        .create_upload(new_upload("hidden.csv", 2, TabCategory::Catalog))
        .unwrap();
    db.set_archived(&hidden.id, true).unwrap();

    let records = db.list_uploads(&ListFilter::default()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, visible.id);
}

#[test]
fn test_list_archived_only() {
    let (_dir, db) = test_db();
    db.create_upload(new_upload("visible.csv", 1, TabCategory::Catalog))
        .unwrap();
    let hidden = db
        .create_upload(new_upload("hidden.csv", 2, TabCategory::Catalog))
        .unwrap();
    db.set_archived(&hidden.id, true).unwrap();

    let filter = ListFilter {
        archived: Some(true),
        ..ListFilter::default()
    };
    let records = db.list_uploads(&filter).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, hidden.id);
    assert!(records.iter().all(|r| r.archived));

    // archived: None includes everything
    let filter = ListFilter {
        archived: None,
        ..ListFilter::default()
    };
    assert_eq!(db.list_uploads(&filter).unwrap().len(), 2);
}

#[test]
fn test_list_filter_by_category_and_status() {
    let (_dir, db) = test_db();
    let done = db
        .create_upload(new_upload("done.csv", 1, TabCategory::Catalog))
        .unwrap();
    complete(&db, &done.id);
    db.create_upload(new_upload("pending.csv", 2, TabCategory::Catalog))
        .unwrap();
    db.create_upload(new_upload("deal.pdf", 3, TabCategory::Agreements))
        .unwrap();

    let filter = ListFilter {
        category: Some(TabCategory::Catalog),
        status: Some(UploadStatus::Complete),
        ..ListFilter::default()
    };
    let records = db.list_uploads(&filter).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, done.id);
}

#[test]
fn test_list_search_matches_file_name_case_insensitive() {
    let (_dir, db) = test_db();
    db.create_upload(new_upload("Q3-Royalties.csv", 1, TabCategory::Royalties))
        .unwrap();
    db.create_upload(new_upload("other.csv", 2, TabCategory::Royalties))
        .unwrap();

    let filter = ListFilter {
        search: Some("royalties".to_string()),
        ..ListFilter::default()
    };
    let records = db.list_uploads(&filter).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].file_name, "Q3-Royalties.csv");
}

#[test]
fn test_list_sort_by_file_size() {
    let (_dir, db) = test_db();
    db.create_upload(new_upload("mid.csv", 50, TabCategory::Catalog))
        .unwrap();
    db.create_upload(new_upload("big.csv", 900, TabCategory::Catalog))
        .unwrap();
    db.create_upload(new_upload("small.csv", 3, TabCategory::Catalog))
        .unwrap();

    let filter = ListFilter {
        sort_by: SortBy::FileSize,
        sort_order: SortOrder::Asc,
        ..ListFilter::default()
    };
    let sizes: Vec<u64> = db
        .list_uploads(&filter)
        .unwrap()
        .iter()
        .map(|r| r.file_size)
        .collect();
    assert_eq!(sizes, vec![3, 50, 900]);

    let filter = ListFilter {
        sort_by: SortBy::FileSize,
        sort_order: SortOrder::Desc,
        ..ListFilter::default()
    };
    let sizes: Vec<u64> = db
        .list_uploads(&filter)
        .unwrap()
        .iter()
        .map(|r| r.file_size)
        .collect();
    assert_eq!(sizes, vec![900, 50, 3]);
}

#[test]
fn test_list_sort_by_file_name_ignores_case() {
    let (_dir, db) = test_db();
    db.create_upload(new_upload("beta.csv", 1, TabCategory::Catalog))
        .unwrap();
    db.create_upload(new_upload("Alpha.csv", 2, TabCategory::Catalog))
        .unwrap();

    let filter = ListFilter {
        sort_by: SortBy::FileName,
        sort_order: SortOrder::Asc,
        ..ListFilter::default()
    };
    let names: Vec<String> = db
        .list_uploads(&filter)
        .unwrap()
        .iter()
        .map(|r| r.file_name.clone())
        .collect();
    assert_eq!(names, vec!["Alpha.csv", "beta.csv"]);
}

#[test]
fn test_list_limit() {
    let (_dir, db) = test_db();
    for i in 0..5 {
        db.create_upload(new_upload(&format!("f{i}.csv"), i, TabCategory::Catalog))
            .unwrap();
    }

    let filter = ListFilter {
        limit: Some(2),
        ..ListFilter::default()
    };
    assert_eq!(db.list_uploads(&filter).unwrap().len(), 2);
}

#[test]
fn test_purge_all() {
    let (_dir, db) = test_db();
    db.create_upload(new_upload("a.csv", 1, TabCategory::Catalog))
        .unwrap();
    db.create_upload(new_upload("b.pdf", 2, TabCategory::Agreements))
        .unwrap();

    let stats = db.purge_all().unwrap();
    assert_eq!(stats.uploads, 2);

    assert!(db.get_all_uploads().unwrap().is_empty());
    assert!(db
        .get_uploads_by_category(TabCategory::Catalog)
        .unwrap()
        .is_empty());
}
