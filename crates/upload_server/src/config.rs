use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// S3 refuses pre-signed requests that live longer than a week.
pub const MAX_PRESIGN_EXPIRY_SECONDS: u64 = 7 * 24 * 60 * 60;
/// S3 multipart uploads accept part numbers 1..=10000.
pub const MAX_PARTS_LIMIT: u32 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub port: u16,

    pub s3_region: String,
    pub s3_bucket: String,
    /// Custom endpoint for S3-compatible stores (minio and friends).
    pub s3_endpoint: Option<String>,
    pub force_path_style: bool,

    pub presign_expiry_seconds: u64,
    pub http_request_timeout_seconds: u64,
    pub max_parts: u32,
    pub key_prefix_len: usize,
    pub cors_allow_origins: Vec<String>,

    pub with_metrics: bool,
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            s3_region: String::new(),
            s3_bucket: String::new(),
            s3_endpoint: None,
            force_path_style: false,
            presign_expiry_seconds: 120,
            http_request_timeout_seconds: 30,
            max_parts: MAX_PARTS_LIMIT,
            key_prefix_len: 5,
            cors_allow_origins: vec!["*".to_string()],
            with_metrics: false,
            metrics_port: 8085,
        }
    }
}

impl Config {
    /// Loads the optional config file, then `APP_*` environment overrides, then the
    /// conventional `AWS_REGION` / `S3_BUCKET` variables for anything still unset.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_sources(config_file, Self::app_environment())?;
        config.apply_aws_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn app_environment() -> config::Environment {
        config::Environment::with_prefix("APP")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("cors_allow_origins")
    }

    pub fn from_sources(
        config_file: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(config_file) = config_file {
            builder = builder.add_source(config::File::from(config_file).required(true));
        }
        let config = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn apply_aws_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.s3_region.is_empty()
            && let Some(region) = lookup("AWS_REGION").or_else(|| lookup("AWS_DEFAULT_REGION"))
        {
            self.s3_region = region;
        }
        if self.s3_bucket.is_empty()
            && let Some(bucket) = lookup("S3_BUCKET")
        {
            self.s3_bucket = bucket;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.s3_region.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "s3_region is not set (APP_S3_REGION or AWS_REGION)".into(),
            ));
        }
        if self.s3_bucket.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "s3_bucket is not set (APP_S3_BUCKET or S3_BUCKET)".into(),
            ));
        }
        if self.presign_expiry_seconds == 0
            || self.presign_expiry_seconds > MAX_PRESIGN_EXPIRY_SECONDS
        {
            return Err(ConfigError::Invalid(format!(
                "presign_expiry_seconds must be within 1..={MAX_PRESIGN_EXPIRY_SECONDS}, got {}",
                self.presign_expiry_seconds
            )));
        }
        if self.max_parts == 0 || self.max_parts > MAX_PARTS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_parts must be within 1..={MAX_PARTS_LIMIT}, got {}",
                self.max_parts
            )));
        }
        if self.key_prefix_len == 0 {
            return Err(ConfigError::Invalid("key_prefix_len must be positive".into()));
        }
        if self.http_request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "http_request_timeout_seconds must be positive".into(),
            ));
        }
        if let Some(origin) = self.cors_allow_origins.iter().find(|origin| {
            *origin != "*" && !origin.starts_with("http://") && !origin.starts_with("https://")
        }) {
            return Err(ConfigError::Invalid(format!(
                "cors origin must be `*` or an http(s) origin, got {origin:?}"
            )));
        }
        Ok(())
    }

    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_seconds)
    }

    pub fn http_request_timeout(&self) -> Duration {
        Duration::from_secs(self.http_request_timeout_seconds)
    }
}
