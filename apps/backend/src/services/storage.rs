//! S3-compatible object storage for uploaded files.

use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Credentials, Region},
    primitives::ByteStream,
    Client,
};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Connection settings for the bucket.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    /// `(access key, secret key)`. Falls back to the default AWS provider chain when absent.
    pub credentials: Option<(String, String)>,
}

impl StorageSettings {
    /// Read settings from environment variables.
    ///
    /// - S3_BUCKET: Bucket name (required)
    /// - S3_REGION: Region, "auto" by default (Cloudflare R2)
    /// - S3_ENDPOINT: Custom endpoint URL for S3-compatible services
    /// - S3_ACCESS_KEY / S3_SECRET_KEY: Explicit credentials
    pub fn from_env() -> Result<Self, StorageError> {
        let bucket = std::env::var("S3_BUCKET")
            .ok()
            .filter(|bucket| !bucket.is_empty())
            .ok_or_else(|| StorageError::Config("S3_BUCKET not set".to_string()))?;

        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string());
        let endpoint = std::env::var("S3_ENDPOINT").ok();
        let credentials = match (std::env::var("S3_ACCESS_KEY"), std::env::var("S3_SECRET_KEY")) {
            (Ok(access_key), Ok(secret_key)) => Some((access_key, secret_key)),
            _ => None,
        };

        Ok(Self {
            bucket,
            region,
            endpoint,
            credentials,
        })
    }
}

/// Object storage client bound to one bucket.
pub struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    /// Create a storage service from environment variables.
    pub async fn from_env() -> Result<Self, StorageError> {
        Self::new(StorageSettings::from_env()?).await
    }

    pub async fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        let region = Region::new(settings.region);

        let mut config_builder = match settings.credentials {
            Some((access_key, secret_key)) => {
                let credentials = Credentials::new(
                    access_key,
                    secret_key,
                    None,  // session token
                    None,  // expiry
                    "env", // provider name
                );
                S3ConfigBuilder::new()
                    .region(region)
                    .credentials_provider(credentials)
                    .behavior_version_latest()
            }
            None => {
                let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                S3ConfigBuilder::from(&shared)
            }
        };

        // Set custom endpoint for R2 or other S3-compatible services
        if let Some(endpoint_url) = settings.endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        let client = Client::from_conf(config_builder.build());

        Ok(Self {
            client,
            bucket: settings.bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload an object and return its key.
    pub async fn upload_file(
        &self,
        key: &str,
        content: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let body = ByteStream::from(content.to_vec());

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        tracing::info!("Uploaded file to S3: {}/{}", self.bucket, key);
        Ok(key.to_string())
    }
}

/// Hex SHA-256 of the content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
