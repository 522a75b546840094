use actix_web::HttpResponse;
use metrics::counter;
use serde::Deserialize;

use crate::AppState;
use crate::blob_storage::StorageError;
use crate::handler::common::{
    require_filename, response::json::GenericResponse, upload_error::UploadError,
};

#[derive(Debug, Deserialize)]
pub struct AbortUploadRequest {
    pub filename: String,
}

/// Aborting an upload the store no longer knows about still answers "Aborted".
pub async fn abort_multipart_upload_handler(
    app: &AppState,
    upload_id: String,
    request: AbortUploadRequest,
) -> Result<HttpResponse, UploadError> {
    let key = require_filename(&request.filename)?;
    tracing::info!("Aborting multipart upload {} for {}", upload_id, key);

    match app.store().abort_multipart_upload(key, &upload_id).await {
        Ok(()) => {}
        Err(StorageError::NoSuchUpload) => {
            tracing::info!(%upload_id, %key, "multipart upload already gone");
        }
        Err(e) => return Err(e.into()),
    }
    counter!("upload_sessions_aborted").increment(1);

    Ok(GenericResponse::ok("Aborted").into_response())
}
