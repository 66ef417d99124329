//! S3-compatible object storage client
//!
//! Single-shot puts against a configured endpoint with path-style
//! addressing. No chunking, no multipart, no retry; failures propagate.

use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::StorageConfig;
use crate::{Error, Result};

/// Object storage client bound to one bucket
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    /// Create a client for the configured endpoint and bucket
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "agribot",
        );

        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&config.endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(true)
            // Single-shot puts: a transient failure propagates instead of retrying
            .retry_config(RetryConfig::disabled())
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket.clone(),
        }
    }

    /// Upload a byte payload under the given key
    ///
    /// # Errors
    ///
    /// Returns error if the put fails
    pub async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|e| Error::Storage(format!("put {key}: {}", DisplayErrorContext(&e))))?;

        tracing::debug!(key, bucket = %self.bucket, "object uploaded");
        Ok(())
    }

    /// Delete an object (best-effort cleanup path)
    ///
    /// # Errors
    ///
    /// Returns error if the delete fails
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("delete {key}: {}", DisplayErrorContext(&e))))?;

        Ok(())
    }
}
