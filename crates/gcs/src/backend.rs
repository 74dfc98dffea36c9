//! StorageBackend implementation over google-cloud-storage

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use google_cloud_storage::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::buckets::delete::DeleteBucketRequest;
use google_cloud_storage::http::buckets::get::GetBucketRequest;
use google_cloud_storage::http::buckets::insert::{
    BucketCreationConfig, InsertBucketParam, InsertBucketRequest,
};
use google_cloud_storage::http::objects::copy::CopyObjectRequest;
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};

use ostor_core::{ByteStream, Error, Provider, RemoteObject, Result, StorageBackend};

/// Service-account credentials for GCS
///
/// Bucket creation is billed to a project, so the project id travels with
/// the credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcsCredentials {
    /// Path to the service-account JSON file
    pub credentials_file: PathBuf,

    /// Project owning created buckets
    pub project_id: String,
}

/// GCS backend, one per credential set
pub struct GcsBackend {
    client: Client,
    project_id: String,
}

impl GcsBackend {
    /// Create a backend from service-account credentials
    pub async fn new(credentials: GcsCredentials) -> Result<Self> {
        let file = CredentialsFile::new_from_file(
            credentials.credentials_file.to_string_lossy().into_owned(),
        )
        .await
        .map_err(|e| Error::Configuration(format!("unable to load GCS credentials: {e}")))?;

        let config = ClientConfig::default()
            .with_credentials(file)
            .await
            .map_err(|e| Error::Configuration(format!("unable to build GCS client: {e}")))?;

        Ok(Self {
            client: Client::new(config),
            project_id: credentials.project_id,
        })
    }
}

fn is_not_found(err: &google_cloud_storage::http::Error) -> bool {
    matches!(err, google_cloud_storage::http::Error::Response(response) if response.code == 404)
}

fn map_remote_error(err: google_cloud_storage::http::Error, subject: String) -> Error {
    if is_not_found(&err) {
        Error::NotFound(subject)
    } else {
        Error::Network(err.to_string())
    }
}

#[async_trait]
impl StorageBackend for GcsBackend {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        // Probe first: an existing, accessible bucket is success
        let probe = self
            .client
            .get_bucket(&GetBucketRequest {
                bucket: bucket.to_string(),
                ..Default::default()
            })
            .await;

        match probe {
            Ok(_) => {
                tracing::debug!(bucket, "bucket already exists");
                Ok(())
            }
            Err(err) if is_not_found(&err) => {
                let location = if region.is_empty() {
                    Provider::Gcs.default_region()
                } else {
                    region
                };

                self.client
                    .insert_bucket(&InsertBucketRequest {
                        name: bucket.to_string(),
                        param: InsertBucketParam {
                            project: self.project_id.clone(),
                            ..Default::default()
                        },
                        bucket: BucketCreationConfig {
                            location: location.to_string(),
                            ..Default::default()
                        },
                    })
                    .await
                    .map_err(|e| Error::Network(e.to_string()))?;

                Ok(())
            }
            Err(err) => Err(Error::Network(err.to_string())),
        }
    }

    async fn delete_bucket(&self, target: &RemoteObject) -> Result<()> {
        self.client
            .delete_bucket(&DeleteBucketRequest {
                bucket: target.bucket.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| map_remote_error(e, target.to_string()))?;

        Ok(())
    }

    async fn upload_file(&self, target: &RemoteObject, source: &Path) -> Result<()> {
        if !source.exists() {
            return Err(Error::NotFound(format!(
                "local file {} does not exist",
                source.display()
            )));
        }

        let data = tokio::fs::read(source).await?;
        let upload_type = UploadType::Simple(Media::new(target.key.clone()));

        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: target.bucket.clone(),
                    ..Default::default()
                },
                data,
                &upload_type,
            )
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(())
    }

    async fn download_file(&self, source: &RemoteObject, target: &Path) -> Result<()> {
        let data = self
            .client
            .download_object(
                &GetObjectRequest {
                    bucket: source.bucket.clone(),
                    object: source.key.clone(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| map_remote_error(e, source.to_string()))?;

        tokio::fs::write(target, &data).await?;
        Ok(())
    }

    async fn download_stream(&self, source: &RemoteObject) -> Result<ByteStream> {
        let stream = self
            .client
            .download_streamed_object(
                &GetObjectRequest {
                    bucket: source.bucket.clone(),
                    object: source.key.clone(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| map_remote_error(e, source.to_string()))?;

        Ok(stream
            .map_err(|e| Error::Network(e.to_string()))
            .boxed())
    }

    async fn list_objects(&self, bucket: &RemoteObject) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects(&ListObjectsRequest {
                    bucket: bucket.bucket.clone(),
                    page_token: page_token.clone(),
                    ..Default::default()
                })
                .await
                .map_err(|e| map_remote_error(e, bucket.to_string()))?;

            if let Some(items) = response.items {
                keys.extend(items.into_iter().map(|object| object.name));
            }

            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(keys)
    }

    async fn delete_object(&self, target: &RemoteObject) -> Result<()> {
        self.client
            .delete_object(&DeleteObjectRequest {
                bucket: target.bucket.clone(),
                object: target.key.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| map_remote_error(e, target.to_string()))?;

        Ok(())
    }

    async fn copy_object(&self, source: &RemoteObject, target: &RemoteObject) -> Result<()> {
        self.client
            .copy_object(&CopyObjectRequest {
                source_bucket: source.bucket.clone(),
                source_object: source.key.clone(),
                destination_bucket: target.bucket.clone(),
                destination_object: target.key.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| map_remote_error(e, source.to_string()))?;

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
