mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Progress callback for blob writes. Invoked with values in 0-100, at
/// minimum once at the start and once at the end of the transfer.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Abstraction over blob storage backends. Keys carry the category
/// prefix (`{category}/{id}.{ext}`); the raw blobs are meaningless
/// without the record store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        on_progress: ProgressFn<'_>,
    ) -> Result<(), ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;
}
