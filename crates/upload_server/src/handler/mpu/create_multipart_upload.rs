use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::HttpResponse;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;
use crate::blob_storage::{MultipartStore, MultipartUpload};
use crate::handler::common::{require_filename, upload_error::UploadError};
use crate::object_key::gen_object_key;

#[derive(Debug, Deserialize)]
pub struct CreateUploadRequest {
    pub filename: String,
    pub parts: u32,
    /// Sent by some clients; not needed to open the session.
    #[serde(default)]
    pub filesize: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadResponse {
    pub filename: String,
    pub pre_signed_urls: BTreeMap<u32, String>,
    pub upload_id: String,
}

/// Aborts the session in the background if dropped while still armed, e.g. when the
/// request times out between opening the session and returning its URLs.
struct PendingSession {
    session: Option<(Arc<dyn MultipartStore>, MultipartUpload)>,
}

impl PendingSession {
    fn new(store: Arc<dyn MultipartStore>, upload: MultipartUpload) -> Self {
        Self {
            session: Some((store, upload)),
        }
    }

    fn disarm(&mut self) {
        self.session = None;
    }
}

impl Drop for PendingSession {
    fn drop(&mut self) {
        let Some((store, upload)) = self.session.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                key = %upload.key,
                upload_id = %upload.upload_id,
                "no runtime to abort abandoned session"
            );
            return;
        };
        runtime.spawn(async move {
            match store
                .abort_multipart_upload(&upload.key, &upload.upload_id)
                .await
            {
                Ok(()) => {
                    info!(
                        key = %upload.key,
                        upload_id = %upload.upload_id,
                        "aborted abandoned session"
                    );
                    counter!("upload_sessions_aborted").increment(1);
                }
                Err(e) => warn!(
                    key = %upload.key,
                    upload_id = %upload.upload_id,
                    "failed to abort abandoned session: {e}"
                ),
            }
        });
    }
}

pub async fn create_multipart_upload_handler(
    app: &AppState,
    request: CreateUploadRequest,
) -> Result<HttpResponse, UploadError> {
    let filename = require_filename(&request.filename)?;
    let parts = request.parts;
    if parts == 0 || parts > app.config.max_parts {
        warn!(
            parts,
            max_parts = app.config.max_parts,
            "request rejected: part count out of range"
        );
        return Err(UploadError::BadRequest);
    }

    let key = gen_object_key(filename, app.config.key_prefix_len);
    let store = app.store();
    let upload = store.create_multipart_upload(&key).await?;
    info!(key = %upload.key, upload_id = %upload.upload_id, parts, "created multipart upload");
    counter!("upload_sessions_created").increment(1);
    let mut pending = PendingSession::new(app.store_handle(), upload.clone());

    let expires_in = app.config.presign_expiry();
    let mut pre_signed_urls = BTreeMap::new();
    for part_number in 1..=parts {
        let presigned = store
            .presign_upload_part(&upload.key, &upload.upload_id, part_number as i32, expires_in)
            .await;
        match presigned {
            Ok(url) => {
                pre_signed_urls.insert(part_number, url);
            }
            Err(e) => {
                // The session is useless without its URLs, release it.
                if let Err(abort_err) = store
                    .abort_multipart_upload(&upload.key, &upload.upload_id)
                    .await
                {
                    warn!(
                        key = %upload.key,
                        upload_id = %upload.upload_id,
                        "failed to abort session after presign failure: {abort_err}"
                    );
                }
                pending.disarm();
                return Err(e.into());
            }
        }
    }
    pending.disarm();
    counter!("presigned_urls_issued").increment(parts as u64);

    Ok(HttpResponse::Ok().json(CreateUploadResponse {
        filename: upload.key,
        pre_signed_urls,
        upload_id: upload.upload_id,
    }))
}
