use super::response::json::GenericResponse;
use crate::blob_storage::StorageError;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use strum::AsRefStr;
use thiserror::Error;

#[derive(Debug, Error, AsRefStr)]
pub enum UploadError {
    #[error("Bad Request")]
    BadRequest,

    #[error("Not Found")]
    NotFound,

    #[error("Request timed out")]
    RequestTimeout,

    /// Provider error text, surfaced to the client verbatim.
    #[error("{0}")]
    Storage(String),
}

impl UploadError {
    #[inline]
    pub fn http_status_code(&self) -> StatusCode {
        match self {
            UploadError::BadRequest => StatusCode::BAD_REQUEST,
            UploadError::NotFound => StatusCode::NOT_FOUND,
            UploadError::RequestTimeout => StatusCode::INTERNAL_SERVER_ERROR,
            UploadError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        self.http_status_code()
    }

    fn error_response(&self) -> HttpResponse {
        GenericResponse::new(self.http_status_code(), self.to_string()).into_response()
    }
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        tracing::debug!(kind = err.as_ref(), "storage error: {err}");
        UploadError::Storage(err.to_string())
    }
}

impl From<actix_web::error::JsonPayloadError> for UploadError {
    fn from(value: actix_web::error::JsonPayloadError) -> Self {
        tracing::warn!("rejected request body: {value}");
        Self::BadRequest
    }
}

impl From<actix_web::error::PathError> for UploadError {
    fn from(value: actix_web::error::PathError) -> Self {
        tracing::warn!("rejected request path: {value}");
        Self::BadRequest
    }
}
