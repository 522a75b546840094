use actix_web::HttpResponse;
use metrics::counter;
use serde::Deserialize;
use tracing::info;

use crate::AppState;
use crate::blob_storage::CompletedPart;
use crate::handler::common::{
    require_filename, response::json::GenericResponse, upload_error::UploadError,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub filename: String,
    pub completed_parts: Vec<CompletedPartRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPartRequest {
    pub e_tag: String,
    pub part_number: i32,
}

impl From<CompletedPartRequest> for CompletedPart {
    fn from(part: CompletedPartRequest) -> Self {
        CompletedPart {
            part_number: part.part_number,
            etag: part.e_tag,
        }
    }
}

/// Forwards the client's part list as-is; the object store decides whether it is complete.
pub async fn complete_multipart_upload_handler(
    app: &AppState,
    upload_id: String,
    request: CompleteUploadRequest,
) -> Result<HttpResponse, UploadError> {
    let key = require_filename(&request.filename)?.to_string();
    let parts: Vec<CompletedPart> = request
        .completed_parts
        .into_iter()
        .map(CompletedPart::from)
        .collect();
    info!(%key, %upload_id, parts = parts.len(), "completing multipart upload");

    let final_key = app
        .store()
        .complete_multipart_upload(&key, &upload_id, parts)
        .await?
        .unwrap_or(key);
    counter!("upload_sessions_completed").increment(1);

    Ok(GenericResponse::ok(final_key).into_response())
}
