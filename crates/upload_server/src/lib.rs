pub mod blob_storage;
mod config;
pub mod handler;
pub mod health;
pub mod object_key;

pub use blob_storage::{
    CompletedPart, MultipartStore, MultipartUpload, S3MultipartStorage, StorageError,
};
pub use config::{Config, ConfigError, MAX_PARTS_LIMIT, MAX_PRESIGN_EXPIRY_SECONDS};

use std::sync::Arc;
use tracing::info;

pub struct AppState {
    pub config: Arc<Config>,
    store: Arc<dyn MultipartStore>,
}

impl AppState {
    /// State backed by the configured S3 bucket.
    pub async fn new(config: Arc<Config>) -> Self {
        let storage = S3MultipartStorage::new(&config).await;
        info!(bucket = %storage.bucket(), "multipart storage ready");
        Self::with_store(config, Arc::new(storage))
    }

    pub fn with_store(config: Arc<Config>, store: Arc<dyn MultipartStore>) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &dyn MultipartStore {
        self.store.as_ref()
    }

    pub fn store_handle(&self) -> Arc<dyn MultipartStore> {
        self.store.clone()
    }
}
