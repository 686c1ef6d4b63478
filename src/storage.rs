//! Object storage for uploaded avatars.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use crate::config;
use crate::error::{Result, ServerError};

/// Contract expected from the avatar store.
///
/// Keys are internal references; callers surface URLs built by
/// [`ObjectStorage::file_url`] instead.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()>;

    fn file_url(&self, key: &str) -> String;
}

/// S3-compatible avatar store.
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3Storage {
    /// Create a new [`S3Storage`] from configuration.
    pub fn new(config: &config::S3) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "persona",
        );
        let s3_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            // MinIO and friends do not resolve bucket subdomains.
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_url: config
                .public_url
                .clone()
                .unwrap_or_else(|| config.endpoint.clone()),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(
                    bucket = %self.bucket,
                    key,
                    error = %err,
                    "avatar upload failed"
                );
                ServerError::Upload
            })?;

        tracing::debug!(bucket = %self.bucket, key, "avatar uploaded");
        Ok(())
    }

    fn file_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(public_url: Option<&str>) -> S3Storage {
        S3Storage::new(&config::S3 {
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            bucket: "avatars".into(),
            access_key: "minioadmin".into(),
            secret_key: "minioadmin".into(),
            public_url: public_url.map(Into::into),
        })
    }

    #[test]
    fn test_file_url_defaults_to_endpoint() {
        let url = storage(None).file_url("avatars/5_cat.png");
        assert_eq!(url, "http://localhost:9000/avatars/avatars/5_cat.png");
    }

    #[test]
    fn test_file_url_uses_public_url() {
        let url =
            storage(Some("https://cdn.example.com/")).file_url("avatars/5_cat.png");
        assert_eq!(url, "https://cdn.example.com/avatars/avatars/5_cat.png");
    }
}
