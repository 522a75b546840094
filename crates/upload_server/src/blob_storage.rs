mod s3_multipart_storage;

pub use s3_multipart_storage::{S3MultipartStorage, create_s3_client};

use async_trait::async_trait;
use std::time::Duration;

/// A multipart upload session opened against the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartUpload {
    pub key: String,
    pub upload_id: String,
}

/// A part the client reports as uploaded, identified by the tag the store returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: i32,
    pub etag: String,
}

/// Object store operations needed to broker a multipart upload.
///
/// Implementations own the target bucket; callers only pass object keys and upload ids.
#[async_trait]
pub trait MultipartStore: Send + Sync {
    /// Opens a new multipart upload session for `key`.
    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload, StorageError>;

    /// Mints a pre-signed `UploadPart` URL for one part of an open session.
    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> Result<String, StorageError>;

    /// Assembles the object from the given parts. Returns the final object key when the
    /// store reports one.
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<Option<String>, StorageError>;

    /// Discards an in-progress session and any parts stored for it.
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error, strum::AsRefStr)]
pub enum StorageError {
    #[error("{0}")]
    CreateMultipartUpload(String),

    #[error("{0}")]
    Presign(String),

    #[error("{0}")]
    CompleteMultipartUpload(String),

    #[error("{0}")]
    AbortMultipartUpload(String),

    #[error("The specified multipart upload does not exist.")]
    NoSuchUpload,
}
