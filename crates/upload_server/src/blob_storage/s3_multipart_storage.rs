use super::{CompletedPart, MultipartStore, MultipartUpload, StorageError};
use crate::config::Config;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client as S3Client,
    config::Region,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart},
};
use std::{fmt::Debug, time::Duration};
use tracing::{debug, info};

/// Create an S3 client for either AWS S3 or an S3-compatible endpoint.
///
/// Credentials come from the default provider chain (env, profile, IMDS, ...). Retries stay
/// with the SDK's standard retry mode.
pub async fn create_s3_client(config: &Config) -> S3Client {
    info!(
        region = %config.s3_region,
        endpoint = config.s3_endpoint.as_deref().unwrap_or("aws"),
        force_path_style = config.force_path_style,
        "creating S3 client"
    );
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .load()
        .await;

    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);
    if let Some(endpoint_url) = &config.s3_endpoint {
        s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
    }
    if config.force_path_style {
        s3_config_builder = s3_config_builder.force_path_style(true);
    }

    S3Client::from_conf(s3_config_builder.build())
}

/// Provider error text as `Code: message`, falling back to the full error chain.
fn sdk_error_text<E, R>(err: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_string(),
        _ => DisplayErrorContext(err).to_string(),
    }
}

pub struct S3MultipartStorage {
    client: S3Client,
    bucket: String,
}

impl S3MultipartStorage {
    pub async fn new(config: &Config) -> Self {
        let client = create_s3_client(config).await;
        Self::from_client(client, config.s3_bucket.clone())
    }

    pub fn from_client(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl MultipartStore for S3MultipartStorage {
    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload, StorageError> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::CreateMultipartUpload(sdk_error_text(&e)))?;

        let upload_id = output
            .upload_id()
            .filter(|upload_id| !upload_id.is_empty())
            .ok_or_else(|| {
                StorageError::CreateMultipartUpload(format!(
                    "no upload id returned for {}/{key}",
                    self.bucket
                ))
            })?;

        Ok(MultipartUpload {
            key: output.key().unwrap_or(key).to_string(),
            upload_id: upload_id.to_string(),
        })
    }

    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let presigning_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let request = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::Presign(sdk_error_text(&e)))?;

        debug!(%key, %upload_id, part_number, "presigned upload part");
        Ok(request.uri().to_string())
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<Option<String>, StorageError> {
        let parts = parts
            .into_iter()
            .map(|part| {
                S3CompletedPart::builder()
                    .e_tag(part.etag)
                    .part_number(part.part_number)
                    .build()
            })
            .collect();
        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        let output = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(|e| StorageError::CompleteMultipartUpload(sdk_error_text(&e)))?;

        Ok(output.key().map(str::to_string))
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), StorageError> {
        match self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                if let Some(service_error) = e.as_service_error()
                    && service_error.is_no_such_upload()
                {
                    return Err(StorageError::NoSuchUpload);
                }
                Err(StorageError::AbortMultipartUpload(sdk_error_text(&e)))
            }
        }
    }
}
