//! StorageBackend trait definition
//!
//! One implementation exists per [`Provider`](crate::location::Provider)
//! value. The trait keeps the
//! orchestrator decoupled from the provider SDKs and mockable for tests.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::location::RemoteObject;

/// Lazy stream of object bytes; the caller owns draining or dropping it.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Primitive operations against one concrete provider
///
/// Implementations are responsible for transparent pagination in
/// [`list_objects`](StorageBackend::list_objects) and must treat "bucket
/// already exists and is owned by the caller" as success in
/// [`create_bucket`](StorageBackend::create_bucket). Policy (staging,
/// non-empty-bucket guards, cross-provider sequencing) lives in the
/// orchestrator, not here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Create a bucket in the given region (provider default when empty)
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, target: &RemoteObject) -> Result<()>;

    /// Upload a local file to the target object
    async fn upload_file(&self, target: &RemoteObject, source: &Path) -> Result<()>;

    /// Download the full object body to a local path, overwriting it
    async fn download_file(&self, source: &RemoteObject, target: &Path) -> Result<()>;

    /// Open the object body as a lazy byte stream
    async fn download_stream(&self, source: &RemoteObject) -> Result<ByteStream>;

    /// List every key in the bucket, in provider-defined order
    async fn list_objects(&self, bucket: &RemoteObject) -> Result<Vec<String>>;

    /// Delete a single object
    async fn delete_object(&self, target: &RemoteObject) -> Result<()>;

    /// Server-side copy of a single object within this provider
    async fn copy_object(&self, source: &RemoteObject, target: &RemoteObject) -> Result<()>;

    /// Server-side copy of a whole bucket within this provider,
    /// preserving key names
    async fn copy_bucket(&self, source: &RemoteObject, target: &RemoteObject) -> Result<()>;
}
