//! upload-manager - Upload lifecycle management for categorized document ingestion
//!
//! This crate tracks each inbound file from submission to a terminal state:
//! - Per-category acceptance policy (catalog / royalties / agreements)
//! - redb embedded database for upload records (ACID, MVCC, crash-safe)
//! - Swappable blob storage behind an async trait (local filesystem backend)
//! - Archive soft-delete and bulk operations over many records
//! - REST API with multipart upload support

pub mod api;
pub mod archive;
pub mod bulk;
pub mod config;
pub mod object_store;
pub mod policy;
pub mod selection;
pub mod stats;
pub mod storage;
pub mod uploader;

use std::sync::Arc;

use archive::ArchiveManager;
use bulk::BulkOperationExecutor;
use config::Config;
use storage::Database;
use uploader::UploadCoordinator;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub object_store: Arc<dyn object_store::ObjectStore>,
    pub uploader: UploadCoordinator,
    pub archiver: ArchiveManager,
    pub bulk: BulkOperationExecutor,
}

impl AppState {
    pub fn new(config: Config, db: Database, store: Arc<dyn object_store::ObjectStore>) -> Self {
        Self {
            uploader: UploadCoordinator::new(db.clone(), Arc::clone(&store)),
            archiver: ArchiveManager::new(db.clone()),
            bulk: BulkOperationExecutor::new(db.clone(), Arc::clone(&store)),
            config,
            db,
            object_store: store,
        }
    }
}
