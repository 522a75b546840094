pub mod common;
pub mod mpu;

use crate::{AppState, health};
use actix_cors::Cors;
use actix_web::{
    HttpRequest, HttpResponse,
    web::{self, Data, Json, Path},
};
use common::upload_error::UploadError;
use metrics::{counter, histogram};
use mpu::{AbortUploadRequest, CompleteUploadRequest, CreateUploadRequest};
use std::{future::Future, sync::Arc, time::Instant};
use strum::IntoStaticStr;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum Endpoint {
    CreateMultipartUpload,
    CompleteMultipartUpload,
    AbortMultipartUpload,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Registers the upload routes, the health route and the JSON error envelope for
/// malformed requests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(|err, _req| UploadError::from(err).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|err, _req| UploadError::from(err).into()))
    .route("/health", web::get().to(health::health))
    .service(
        web::scope("/upload")
            .route("", web::post().to(create_upload))
            .route("/{upload_id}/abort", web::post().to(abort_upload))
            .route("/{upload_id}/complete", web::post().to(complete_upload)),
    )
    .default_service(web::to(not_found));
}

/// CORS for browser clients uploading straight from a web page. `*` allows any origin.
pub fn build_cors(allow_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    if allow_origins.iter().any(|origin| origin == "*") {
        return cors.allow_any_origin();
    }
    allow_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

async fn create_upload(
    app: Data<Arc<AppState>>,
    body: Json<CreateUploadRequest>,
) -> Result<HttpResponse, UploadError> {
    let app = app.get_ref().clone();
    run_with_timeout(
        &app,
        Endpoint::CreateMultipartUpload,
        mpu::create_multipart_upload_handler(&app, body.into_inner()),
    )
    .await
}

async fn complete_upload(
    app: Data<Arc<AppState>>,
    path: Path<String>,
    body: Json<CompleteUploadRequest>,
) -> Result<HttpResponse, UploadError> {
    let app = app.get_ref().clone();
    run_with_timeout(
        &app,
        Endpoint::CompleteMultipartUpload,
        mpu::complete_multipart_upload_handler(&app, path.into_inner(), body.into_inner()),
    )
    .await
}

async fn abort_upload(
    app: Data<Arc<AppState>>,
    path: Path<String>,
    body: Json<AbortUploadRequest>,
) -> Result<HttpResponse, UploadError> {
    let app = app.get_ref().clone();
    run_with_timeout(
        &app,
        Endpoint::AbortMultipartUpload,
        mpu::abort_multipart_upload_handler(&app, path.into_inner(), body.into_inner()),
    )
    .await
}

async fn not_found(req: HttpRequest) -> Result<HttpResponse, UploadError> {
    warn!(method = %req.method(), path = %req.path(), "no route");
    Err(UploadError::NotFound)
}

async fn run_with_timeout<F>(
    app: &AppState,
    endpoint: Endpoint,
    handler: F,
) -> Result<HttpResponse, UploadError>
where
    F: Future<Output = Result<HttpResponse, UploadError>>,
{
    let start = Instant::now();
    let endpoint_name = endpoint.as_str();

    let result = tokio::time::timeout(app.config.http_request_timeout(), handler).await;
    let duration = start.elapsed();

    let result = match result {
        Ok(result) => result,
        Err(_) => {
            error!(endpoint = %endpoint_name, "request timed out");
            counter!("request_timeout", "endpoint" => endpoint_name).increment(1);
            return Err(UploadError::RequestTimeout);
        }
    };

    match &result {
        Ok(_) => {
            histogram!("request_duration_nanos", "status" => format!("{endpoint_name}_Ok"))
                .record(duration.as_nanos() as f64);
        }
        Err(e) => {
            histogram!("request_duration_nanos", "status" => format!("{endpoint_name}_Err"))
                .record(duration.as_nanos() as f64);
            if e.http_status_code().is_client_error() {
                warn!(endpoint = %endpoint_name, error = ?e, "rejected request");
            } else {
                error!(endpoint = %endpoint_name, error = ?e, "failed to handle request");
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_names() {
        assert_eq!(Endpoint::CreateMultipartUpload.as_str(), "CreateMultipartUpload");
        assert_eq!(
            Endpoint::CompleteMultipartUpload.as_str(),
            "CompleteMultipartUpload"
        );
        assert_eq!(Endpoint::AbortMultipartUpload.as_str(), "AbortMultipartUpload");
    }
}
