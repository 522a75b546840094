use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use upload_server::{CompletedPart, Config, MultipartStore, MultipartUpload, StorageError};

pub const TEST_BUCKET: &str = "test-bucket";

#[allow(dead_code)]
#[derive(Default)]
pub struct FakeMultipartStore {
    pub(crate) next_id: AtomicU64,
    pub(crate) state: Mutex<State>,
    pub(crate) calls: AtomicUsize,

    pub fail_create: Option<String>,
    /// Fails presigning once this part number is reached.
    pub fail_presign_at: Option<i32>,
    pub fail_complete: Option<String>,
    pub fail_abort: Option<String>,
    pub create_delay: Option<Duration>,
    pub presign_delay: Option<Duration>,
}

#[derive(Default)]
pub(crate) struct State {
    open: HashMap<String, String>,
    completed: Vec<(String, Vec<CompletedPart>)>,
    aborted: Vec<String>,
}

#[allow(dead_code)]
impl FakeMultipartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, upload_id: &str) -> bool {
        self.state.lock().unwrap().open.contains_key(upload_id)
    }

    pub fn key_of(&self, upload_id: &str) -> Option<String> {
        self.state.lock().unwrap().open.get(upload_id).cloned()
    }

    pub fn aborted(&self) -> Vec<String> {
        self.state.lock().unwrap().aborted.clone()
    }

    pub fn completed(&self) -> Vec<(String, Vec<CompletedPart>)> {
        self.state.lock().unwrap().completed.clone()
    }

    /// Number of store operations invoked so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MultipartStore for FakeMultipartStore {
    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(text) = &self.fail_create {
            return Err(StorageError::CreateMultipartUpload(text.clone()));
        }
        let upload_id = format!("upload-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.state
            .lock()
            .unwrap()
            .open
            .insert(upload_id.clone(), key.to_string());
        Ok(MultipartUpload {
            key: key.to_string(),
            upload_id,
        })
    }

    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.presign_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_presign_at.is_some_and(|at| part_number >= at) {
            return Err(StorageError::Presign(format!(
                "failed to presign part {part_number}"
            )));
        }
        Ok(format!(
            "https://{TEST_BUCKET}.s3.test/{key}?partNumber={part_number}&uploadId={upload_id}&X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<Option<String>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(text) = &self.fail_complete {
            return Err(StorageError::CompleteMultipartUpload(text.clone()));
        }
        let mut state = self.state.lock().unwrap();
        if state.open.remove(upload_id).is_none() {
            return Err(StorageError::CompleteMultipartUpload(
                "NoSuchUpload: The specified multipart upload does not exist.".into(),
            ));
        }
        state.completed.push((upload_id.to_string(), parts));
        Ok(Some(key.to_string()))
    }

    async fn abort_multipart_upload(
        &self,
        _key: &str,
        upload_id: &str,
    ) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(text) = &self.fail_abort {
            return Err(StorageError::AbortMultipartUpload(text.clone()));
        }
        let mut state = self.state.lock().unwrap();
        if state.open.remove(upload_id).is_none() {
            return Err(StorageError::NoSuchUpload);
        }
        state.aborted.push(upload_id.to_string());
        Ok(())
    }
}

#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        s3_region: "us-east-1".into(),
        s3_bucket: TEST_BUCKET.into(),
        ..Default::default()
    }
}

/// Builds the full route table over the given config and store.
#[macro_export]
macro_rules! init_app {
    ($config:expr, $store:expr) => {{
        let config: upload_server::Config = $config;
        let cors = upload_server::handler::build_cors(&config.cors_allow_origins);
        let store: std::sync::Arc<dyn upload_server::MultipartStore> = $store;
        let state = upload_server::AppState::with_store(std::sync::Arc::new(config), store);
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(std::sync::Arc::new(state)))
                .wrap(cors)
                .configure(upload_server::handler::configure),
        )
        .await
    }};
}
