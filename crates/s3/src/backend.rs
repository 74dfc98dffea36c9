//! StorageBackend implementation over aws-sdk-s3

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream as S3Body;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use futures::StreamExt;

use ostor_core::{ByteStream, Error, Provider, RemoteObject, Result, StorageBackend};

use crate::pool::{ClientPool, S3Credentials};

/// AWS backend, one per credential set
pub struct S3Backend {
    pool: ClientPool,
}

impl S3Backend {
    /// Create a backend from static credentials; clients are built
    /// lazily per region
    pub fn new(credentials: S3Credentials) -> Self {
        Self {
            pool: ClientPool::new(credentials),
        }
    }
}

/// Map an SDK error string onto the core taxonomy
fn map_remote_error(err_str: String, subject: String) -> Error {
    if err_str.contains("NotFound")
        || err_str.contains("NoSuchKey")
        || err_str.contains("NoSuchBucket")
    {
        Error::NotFound(subject)
    } else {
        Error::Network(err_str)
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let client = self.pool.client(region).await;

        let mut request = client.create_bucket().bucket(bucket);
        // The default region rejects an explicit location constraint
        if !region.is_empty() && region != Provider::Aws.default_region() {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_bucket_already_owned_by_you() {
                    tracing::debug!(bucket, "bucket already exists and is owned by us");
                    Ok(())
                } else {
                    Err(Error::Network(service_err.to_string()))
                }
            }
        }
    }

    async fn delete_bucket(&self, target: &RemoteObject) -> Result<()> {
        self.pool
            .client(&target.region)
            .await
            .delete_bucket()
            .bucket(&target.bucket)
            .send()
            .await
            .map_err(|e| map_remote_error(e.to_string(), target.to_string()))?;

        Ok(())
    }

    async fn upload_file(&self, target: &RemoteObject, source: &Path) -> Result<()> {
        if !source.exists() {
            return Err(Error::NotFound(format!(
                "local file {} does not exist",
                source.display()
            )));
        }

        let body = S3Body::from_path(source)
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        self.pool
            .client(&target.region)
            .await
            .put_object()
            .bucket(&target.bucket)
            .key(&target.key)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(())
    }

    async fn download_file(&self, source: &RemoteObject, target: &Path) -> Result<()> {
        let response = self
            .pool
            .client(&source.region)
            .await
            .get_object()
            .bucket(&source.bucket)
            .key(&source.key)
            .send()
            .await
            .map_err(|e| map_remote_error(e.to_string(), source.to_string()))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes();

        tokio::fs::write(target, &data).await?;
        Ok(())
    }

    async fn download_stream(&self, source: &RemoteObject) -> Result<ByteStream> {
        let response = self
            .pool
            .client(&source.region)
            .await
            .get_object()
            .bucket(&source.bucket)
            .key(&source.key)
            .send()
            .await
            .map_err(|e| map_remote_error(e.to_string(), source.to_string()))?;

        let stream = futures::stream::try_unfold(response.body, |mut body| async move {
            match body.try_next().await {
                Ok(Some(chunk)) => Ok(Some((chunk, body))),
                Ok(None) => Ok(None),
                Err(e) => Err(Error::Network(e.to_string())),
            }
        });

        Ok(stream.boxed())
    }

    async fn list_objects(&self, bucket: &RemoteObject) -> Result<Vec<String>> {
        let client = self.pool.client(&bucket.region).await;

        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = client.list_objects_v2().bucket(&bucket.bucket);
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| map_remote_error(e.to_string(), bucket.to_string()))?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            if response.is_truncated().unwrap_or(false) {
                continuation_token = response.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        Ok(keys)
    }

    async fn delete_object(&self, target: &RemoteObject) -> Result<()> {
        self.pool
            .client(&target.region)
            .await
            .delete_object()
            .bucket(&target.bucket)
            .key(&target.key)
            .send()
            .await
            .map_err(|e| map_remote_error(e.to_string(), target.to_string()))?;

        Ok(())
    }

    async fn copy_object(&self, source: &RemoteObject, target: &RemoteObject) -> Result<()> {
        // The copy executes against the target's region when it has one
        let region = if !target.region.is_empty()
            && target.region != Provider::Aws.default_region()
        {
            &target.region
        } else {
            &source.region
        };

        let copy_source = format!("{}/{}", source.bucket, source.key);

        self.pool
            .client(region)
            .await
            .copy_object()
            .copy_source(&copy_source)
            .bucket(&target.bucket)
            .key(&target.key)
            .send()
            .await
            .map_err(|e| map_remote_error(e.to_string(), source.to_string()))?;

        Ok(())
    }

    async fn copy_bucket(&self, source: &RemoteObject, target: &RemoteObject) -> Result<()> {
        let keys = self.list_objects(source).await?;
        for key in keys {
            self.copy_object(&source.with_key(&key), &target.with_key(&key))
                .await?;
        }
        Ok(())
    }
}
