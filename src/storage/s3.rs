//! S3-compatible object storage implementation.
//!
//! Every write is a whole-object `PUT`, so each object is replaced
//! atomically. There is no transaction across objects.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::StorageConfig;
use crate::storage::Storage;

/// Object-store backend addressed by `{prefix}/{key}`.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Create S3 storage from the environment.
    ///
    /// `R2_ENDPOINT`, `R2_ACCESS_KEY_ID` and `R2_SECRET_ACCESS_KEY` select an
    /// R2-style endpoint with static credentials; without them the default
    /// AWS credential chain is used. `S3_BUCKET` and `S3_PREFIX` override
    /// the configured bucket and prefix.
    pub async fn from_env(config: &StorageConfig) -> Result<Self> {
        // .env is only a convenience for local runs
        let _ = dotenv::dotenv();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let (Ok(endpoint), Ok(key_id), Ok(secret)) = (
            std::env::var("R2_ENDPOINT"),
            std::env::var("R2_ACCESS_KEY_ID"),
            std::env::var("R2_SECRET_ACCESS_KEY"),
        ) {
            log::info!("Using object store endpoint {}", endpoint);
            loader = loader
                .endpoint_url(endpoint)
                .region(Region::new("auto"))
                .credentials_provider(Credentials::new(key_id, secret, None, None, "env"));
        }

        let sdk_config = loader.load().await;
        let client = Client::new(&sdk_config);

        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| config.bucket.clone());
        let prefix = std::env::var("S3_PREFIX").unwrap_or_else(|_| config.prefix.clone());
        if bucket.trim().is_empty() {
            return Err(AppError::config("No bucket configured for s3 storage"));
        }

        Ok(Self::new(client, bucket, prefix))
    }

    /// Inverse of `object_key`; `None` for keys outside the prefix.
    fn relative_key<'k>(&self, object_key: &'k str) -> Option<&'k str> {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            Some(object_key)
        } else {
            object_key
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/'))
        }
    }

    fn object_key(&self, key: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", prefix, key)
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let object_key = self.object_key(key);
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output.body.collect().await.map_err(AppError::s3)?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                // Check if it's a "not found" error
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No existing data at s3://{}/{}", self.bucket, object_key);
                    Ok(None)
                } else {
                    Err(AppError::s3(service_err))
                }
            }
        }
    }

    async fn write_bytes(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let object_key = self.object_key(key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::s3(e.into_service_error()))?;

        log::debug!(
            "Wrote {} bytes to s3://{}/{}",
            bytes.len(),
            self.bucket,
            object_key
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::s3(service_err))
                }
            }
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(self.object_key(prefix))
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AppError::s3(e.into_service_error()))?;
            for object in page.contents() {
                // folder markers carry no data
                if let Some(key) = object
                    .key()
                    .filter(|k| !k.ends_with('/'))
                    .and_then(|k| self.relative_key(k))
                {
                    keys.push(key.to_string());
                }
            }
        }

        log::debug!(
            "Listed {} objects under s3://{}/{}",
            keys.len(),
            self.bucket,
            self.object_key(prefix)
        );
        keys.sort();
        Ok(keys)
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, self.object_key(key))
    }
}
