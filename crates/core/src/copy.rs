//! Copy orchestration
//!
//! [`Storage`] owns a registry mapping each [`Provider`] to its backend and
//! decides, for a source/target location pair, which backend calls realize
//! the copy. Cross-provider transfers have no server-side primitive and are
//! staged through a uniquely named temporary file that is removed
//! unconditionally, on success and on failure.
//!
//! The orchestrator is sequential: each object runs to completion before the
//! next begins, and the first unrecoverable error aborts the whole run.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::backend::{ByteStream, StorageBackend};
use crate::error::{Error, Result};
use crate::location::{Provider, RemoteObject, StorageLocation};
use crate::parse::parse_location;

/// Provider-agnostic storage front end
///
/// Holds one backend per registered provider. Backend selection is a pure
/// function of [`RemoteObject::provider`]; an unregistered provider is a
/// configuration error.
pub struct Storage {
    backends: HashMap<Provider, Arc<dyn StorageBackend>>,
}

impl Storage {
    /// Create a storage front end with no registered backends
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Register the backend for a provider, replacing any previous one
    pub fn register(&mut self, provider: Provider, backend: Arc<dyn StorageBackend>) {
        self.backends.insert(provider, backend);
    }

    fn backend(&self, provider: Provider) -> Result<&Arc<dyn StorageBackend>> {
        self.backends.get(&provider).ok_or_else(|| {
            Error::Configuration(format!("no backend registered for provider {provider}"))
        })
    }

    /// Copy between two locations given as raw strings
    pub async fn copy_from_str(&self, source: &str, target: &str) -> Result<()> {
        let source = parse_location(source)?;
        let target = parse_location(target)?;
        self.copy(&source, &target).await
    }

    /// Copy between two locations
    ///
    /// Strategy selection by location kind:
    /// - local → remote: ensure the bucket exists, then upload
    /// - remote → local: download
    /// - remote → remote, same provider: server-side object or bucket copy
    /// - remote → remote, different providers: staged through a local
    ///   temporary file
    /// - local → local: unsupported
    ///
    /// Remote-to-remote copies require both sides to agree on scope: both
    /// object keys, or both whole buckets.
    pub async fn copy(&self, source: &StorageLocation, target: &StorageLocation) -> Result<()> {
        match (source, target) {
            (StorageLocation::Local(src), StorageLocation::Remote(dst)) => {
                tracing::debug!(source = %src.display(), target = %dst, "upload");
                let backend = self.backend(dst.provider)?;
                backend.create_bucket(&dst.bucket, &dst.region).await?;
                backend.upload_file(dst, src).await
            }
            (StorageLocation::Remote(src), StorageLocation::Local(dst)) => {
                tracing::debug!(source = %src, target = %dst.display(), "download");
                self.backend(src.provider)?.download_file(src, dst).await
            }
            (StorageLocation::Remote(src), StorageLocation::Remote(dst)) => {
                self.copy_remote(src, dst).await
            }
            (StorageLocation::Local(_), StorageLocation::Local(_)) => Err(Error::Configuration(
                "local-to-local copy is not supported; use the filesystem directly".into(),
            )),
        }
    }

    async fn copy_remote(&self, src: &RemoteObject, dst: &RemoteObject) -> Result<()> {
        let bucket_scope = match (src.is_bucket_scope(), dst.is_bucket_scope()) {
            (true, true) => true,
            (false, false) => false,
            _ => {
                return Err(Error::Configuration(format!(
                    "ambiguous key scoping: source {src} and target {dst} \
                     must both address objects or both address whole buckets"
                )));
            }
        };

        let target_backend = self.backend(dst.provider)?;
        target_backend
            .create_bucket(&dst.bucket, &dst.region)
            .await?;

        if src.provider == dst.provider {
            tracing::debug!(source = %src, target = %dst, "server-side copy");
            if bucket_scope {
                target_backend.copy_bucket(src, dst).await
            } else {
                target_backend.copy_object(src, dst).await
            }
        } else if bucket_scope {
            self.copy_bucket_staged(src, dst).await
        } else {
            self.copy_object_staged(src, dst).await
        }
    }

    /// Cross-provider single-object copy, staged through the system temp
    /// directory.
    async fn copy_object_staged(&self, src: &RemoteObject, dst: &RemoteObject) -> Result<()> {
        let source_backend = self.backend(src.provider)?;
        let target_backend = self.backend(dst.provider)?;

        tracing::debug!(source = %src, target = %dst, "staged cross-provider copy");

        let staging = tempfile::Builder::new().prefix("ostor-stage-").tempfile()?;
        let staging_path = staging.path().to_path_buf();

        let transfer = async {
            source_backend.download_file(src, &staging_path).await?;
            target_backend.upload_file(dst, &staging_path).await
        }
        .await;

        // The staging file must never outlive the operation; a failed
        // removal is reported but does not mask the transfer outcome.
        if let Err(err) = staging.close() {
            tracing::warn!(
                path = %staging_path.display(),
                error = %err,
                "failed to remove staging file"
            );
        }

        transfer
    }

    /// Cross-provider whole-bucket copy: one staged object copy per source
    /// key, preserving key names. The first failing key aborts the run;
    /// previously copied keys remain at the target.
    async fn copy_bucket_staged(&self, src: &RemoteObject, dst: &RemoteObject) -> Result<()> {
        let keys = self.backend(src.provider)?.list_objects(src).await?;
        for key in keys {
            self.copy_object_staged(&src.with_key(&key), &dst.with_key(&key))
                .await?;
        }
        Ok(())
    }

    /// Create the bucket named by the target, in its region
    pub async fn create_bucket(&self, target: &RemoteObject) -> Result<()> {
        self.backend(target.provider)?
            .create_bucket(&target.bucket, &target.region)
            .await
    }

    /// Delete a bucket
    ///
    /// A non-empty bucket is only deleted when `delete_if_not_empty` is set;
    /// otherwise the deletion is skipped with a warning and the call
    /// succeeds without effect. When confirmed, every contained object is
    /// deleted first, then the bucket itself.
    pub async fn delete_bucket(
        &self,
        target: &RemoteObject,
        delete_if_not_empty: bool,
    ) -> Result<()> {
        let backend = self.backend(target.provider)?;
        let keys = backend.list_objects(target).await?;

        if !keys.is_empty() && !delete_if_not_empty {
            tracing::warn!(
                bucket = %target.bucket,
                "bucket is not empty and was not deleted; \
                 set delete_if_not_empty to delete it with its contents"
            );
            return Ok(());
        }

        for key in keys {
            backend.delete_object(&target.with_key(key)).await?;
        }
        backend.delete_bucket(target).await
    }

    /// List every key in the target bucket
    pub async fn list_objects(&self, target: &RemoteObject) -> Result<Vec<String>> {
        self.backend(target.provider)?.list_objects(target).await
    }

    /// List every key in a bucket given as a raw string
    pub async fn list_objects_from_str(&self, target: &str) -> Result<Vec<String>> {
        let target = parse_remote(target)?;
        self.list_objects(&target).await
    }

    /// Delete a single object
    pub async fn delete_object(&self, target: &RemoteObject) -> Result<()> {
        self.backend(target.provider)?.delete_object(target).await
    }

    /// Delete a single object given as a raw string
    pub async fn delete_object_from_str(&self, target: &str) -> Result<()> {
        let target = parse_remote(target)?;
        self.delete_object(&target).await
    }

    /// Upload a local file to the target object
    pub async fn upload_file(&self, target: &RemoteObject, source: &Path) -> Result<()> {
        self.backend(target.provider)?
            .upload_file(target, source)
            .await
    }

    /// Download an object to a local path
    pub async fn download_file(&self, source: &RemoteObject, target: &Path) -> Result<()> {
        self.backend(source.provider)?
            .download_file(source, target)
            .await
    }

    /// Open an object as a lazy byte stream
    pub async fn download_stream(&self, source: &RemoteObject) -> Result<ByteStream> {
        self.backend(source.provider)?.download_stream(source).await
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a raw string and require it to name a remote location
fn parse_remote(input: &str) -> Result<RemoteObject> {
    match parse_location(input)? {
        StorageLocation::Remote(remote) => Ok(remote),
        StorageLocation::Local(path) => Err(Error::Configuration(format!(
            "expected a remote location, got local path {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockStorageBackend;
    use bytes::Bytes;
    use futures::StreamExt;
    use mockall::Sequence;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn storage_with(provider: Provider, backend: MockStorageBackend) -> Storage {
        let mut storage = Storage::new();
        storage.register(provider, Arc::new(backend));
        storage
    }

    fn local_fixture(content: &[u8]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[tokio::test]
    async fn test_upload_creates_bucket_then_uploads() {
        let file = local_fixture(b"png bytes");
        let src = StorageLocation::Local(file.path().to_path_buf());
        // Empty key: passed through unchanged, the caller picks the default
        let dst_remote = RemoteObject::new(Provider::Gcs, "media", "");
        let dst = StorageLocation::Remote(dst_remote.clone());

        let mut seq = Sequence::new();
        let mut backend = MockStorageBackend::new();
        backend
            .expect_create_bucket()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|bucket, region| bucket == "media" && region.is_empty())
            .returning(|_, _| Ok(()));
        let expected_path = file.path().to_path_buf();
        backend
            .expect_upload_file()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |target, path| target.key.is_empty() && path == expected_path)
            .returning(|_, _| Ok(()));

        let storage = storage_with(Provider::Gcs, backend);
        storage.copy(&src, &dst).await.unwrap();
    }

    #[tokio::test]
    async fn test_download_calls_backend_directly() {
        let src_remote = RemoteObject::new(Provider::Aws, "media", "logo.png");
        let src = StorageLocation::Remote(src_remote);
        let dst = StorageLocation::Local(PathBuf::from("/tmp/logo.png"));

        let mut backend = MockStorageBackend::new();
        // No create_bucket expectation: any bucket call would fail the test
        backend
            .expect_download_file()
            .times(1)
            .withf(|source, path| {
                source.key == "logo.png" && path == Path::new("/tmp/logo.png")
            })
            .returning(|_, _| Ok(()));

        let storage = storage_with(Provider::Aws, backend);
        storage.copy(&src, &dst).await.unwrap();
    }

    #[tokio::test]
    async fn test_same_provider_object_copy_is_server_side() {
        let src = RemoteObject::new(Provider::Aws, "src-bucket", "a.txt");
        let dst = RemoteObject::new(Provider::Aws, "dst-bucket", "b.txt");

        let mut seq = Sequence::new();
        let mut backend = MockStorageBackend::new();
        backend
            .expect_create_bucket()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|bucket, _| bucket == "dst-bucket")
            .returning(|_, _| Ok(()));
        backend
            .expect_copy_object()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|source, target| source.key == "a.txt" && target.key == "b.txt")
            .returning(|_, _| Ok(()));

        let storage = storage_with(Provider::Aws, backend);
        storage
            .copy(&src.clone().into(), &dst.clone().into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_same_provider_bucket_copy_is_server_side() {
        let src = RemoteObject::new(Provider::Gcs, "src-bucket", "");
        let dst = RemoteObject::new(Provider::Gcs, "dst-bucket", "");

        let mut seq = Sequence::new();
        let mut backend = MockStorageBackend::new();
        backend
            .expect_create_bucket()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        backend
            .expect_copy_bucket()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|source, target| {
                source.bucket == "src-bucket" && target.bucket == "dst-bucket"
            })
            .returning(|_, _| Ok(()));

        let storage = storage_with(Provider::Gcs, backend);
        storage.copy(&src.into(), &dst.into()).await.unwrap();
    }

    #[tokio::test]
    async fn test_cross_provider_object_copy_stages_through_temp_file() {
        let src = RemoteObject::new(Provider::Aws, "bucketX", "keyY");
        let dst = RemoteObject::new(Provider::Gcs, "bucketZ", "keyY");

        let staged: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));

        let mut seq = Sequence::new();
        let mut source_backend = MockStorageBackend::new();
        let mut target_backend = MockStorageBackend::new();

        target_backend
            .expect_create_bucket()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|bucket, _| bucket == "bucketZ")
            .returning(|_, _| Ok(()));

        let captured = staged.clone();
        source_backend
            .expect_download_file()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, path| {
                *captured.lock().unwrap() = Some(path.to_path_buf());
                std::fs::write(path, b"object body").unwrap();
                Ok(())
            });

        let captured = staged.clone();
        target_backend
            .expect_upload_file()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |target, path| {
                let staged_path = captured.lock().unwrap().clone().unwrap();
                target.bucket == "bucketZ"
                    && target.key == "keyY"
                    && path == staged_path
                    && path.exists()
            })
            .returning(|_, _| Ok(()));

        let mut storage = Storage::new();
        storage.register(Provider::Aws, Arc::new(source_backend));
        storage.register(Provider::Gcs, Arc::new(target_backend));

        storage
            .copy(&src.into(), &dst.into())
            .await
            .unwrap();

        let staged_path = staged.lock().unwrap().clone().unwrap();
        assert!(
            !staged_path.exists(),
            "staging file {} left behind",
            staged_path.display()
        );
    }

    #[tokio::test]
    async fn test_cross_provider_copy_removes_temp_file_on_upload_failure() {
        let src = RemoteObject::new(Provider::Aws, "bucketX", "keyY");
        let dst = RemoteObject::new(Provider::Gcs, "bucketZ", "keyY");

        let staged: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));

        let mut source_backend = MockStorageBackend::new();
        let mut target_backend = MockStorageBackend::new();

        target_backend
            .expect_create_bucket()
            .times(1)
            .returning(|_, _| Ok(()));

        let captured = staged.clone();
        source_backend
            .expect_download_file()
            .times(1)
            .returning(move |_, path| {
                *captured.lock().unwrap() = Some(path.to_path_buf());
                std::fs::write(path, b"object body").unwrap();
                Ok(())
            });

        target_backend
            .expect_upload_file()
            .times(1)
            .returning(|_, _| Err(Error::Network("connection reset".into())));

        let mut storage = Storage::new();
        storage.register(Provider::Aws, Arc::new(source_backend));
        storage.register(Provider::Gcs, Arc::new(target_backend));

        let result = storage.copy(&src.into(), &dst.into()).await;
        assert!(matches!(result, Err(Error::Network(_))));

        let staged_path = staged.lock().unwrap().clone().unwrap();
        assert!(!staged_path.exists());
    }

    #[tokio::test]
    async fn test_cross_provider_bucket_copy_preserves_keys() {
        let src = RemoteObject::new(Provider::Aws, "bucketX", "");
        let dst = RemoteObject::new(Provider::Gcs, "bucketZ", "");

        let mut source_backend = MockStorageBackend::new();
        let mut target_backend = MockStorageBackend::new();

        target_backend
            .expect_create_bucket()
            .times(1)
            .returning(|_, _| Ok(()));
        source_backend
            .expect_list_objects()
            .times(1)
            .withf(|bucket| bucket.bucket == "bucketX")
            .returning(|_| Ok(vec!["a.txt".into(), "nested/b.txt".into()]));
        source_backend
            .expect_download_file()
            .times(2)
            .returning(|_, path| {
                std::fs::write(path, b"body").unwrap();
                Ok(())
            });

        let uploaded: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let captured = uploaded.clone();
        target_backend
            .expect_upload_file()
            .times(2)
            .returning(move |target, _| {
                captured.lock().unwrap().push(target.key.clone());
                Ok(())
            });

        let mut storage = Storage::new();
        storage.register(Provider::Aws, Arc::new(source_backend));
        storage.register(Provider::Gcs, Arc::new(target_backend));

        storage.copy(&src.into(), &dst.into()).await.unwrap();

        assert_eq!(
            *uploaded.lock().unwrap(),
            vec!["a.txt".to_string(), "nested/b.txt".to_string()]
        );
    }

    #[tokio::test]
    async fn test_key_scope_mismatch_is_configuration_error() {
        // Source addresses an object, target a whole bucket: no backend
        // call may happen (the mock has no expectations).
        let src = RemoteObject::new(Provider::Aws, "bucketX", "keyY");
        let dst = RemoteObject::new(Provider::Aws, "bucketZ", "");

        let storage = storage_with(Provider::Aws, MockStorageBackend::new());
        let result = storage.copy(&src.into(), &dst.into()).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_local_to_local_is_configuration_error() {
        let file = local_fixture(b"x");
        let src = StorageLocation::Local(file.path().to_path_buf());
        let dst = StorageLocation::Local(PathBuf::from("/tmp/out"));

        let storage = Storage::new();
        let result = storage.copy(&src, &dst).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_unregistered_provider_is_configuration_error() {
        let file = local_fixture(b"x");
        let src = StorageLocation::Local(file.path().to_path_buf());
        let dst = StorageLocation::Remote(RemoteObject::new(Provider::Gcs, "media", "k"));

        let storage = Storage::new();
        let result = storage.copy(&src, &dst).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_delete_bucket_skips_non_empty_without_confirmation() {
        let bucket = RemoteObject::new(Provider::Aws, "data", "");

        let mut backend = MockStorageBackend::new();
        backend
            .expect_list_objects()
            .times(1)
            .returning(|_| Ok(vec!["k".into()]));
        // No delete_object / delete_bucket expectations: zero delete calls

        let storage = storage_with(Provider::Aws, backend);
        storage.delete_bucket(&bucket, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_bucket_drains_objects_when_confirmed() {
        let bucket = RemoteObject::new(Provider::Aws, "data", "");

        let mut seq = Sequence::new();
        let mut backend = MockStorageBackend::new();
        backend
            .expect_list_objects()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["k1".into(), "k2".into()]));
        backend
            .expect_delete_object()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|target| target.key == "k1")
            .returning(|_| Ok(()));
        backend
            .expect_delete_object()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|target| target.key == "k2")
            .returning(|_| Ok(()));
        backend
            .expect_delete_bucket()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let storage = storage_with(Provider::Aws, backend);
        storage.delete_bucket(&bucket, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_empty_bucket_without_confirmation() {
        let bucket = RemoteObject::new(Provider::Gcs, "data", "");

        let mut backend = MockStorageBackend::new();
        backend
            .expect_list_objects()
            .times(1)
            .returning(|_| Ok(vec![]));
        backend
            .expect_delete_bucket()
            .times(1)
            .returning(|_| Ok(()));

        let storage = storage_with(Provider::Gcs, backend);
        storage.delete_bucket(&bucket, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_download_stream_forwards_backend_stream() {
        let src = RemoteObject::new(Provider::Aws, "media", "logo.png");

        let mut backend = MockStorageBackend::new();
        backend.expect_download_stream().times(1).returning(|_| {
            let chunks = vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];
            Ok(futures::stream::iter(chunks).boxed())
        });

        let storage = storage_with(Provider::Aws, backend);
        let mut stream = storage.download_stream(&src).await.unwrap();

        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"abcd");
    }

    #[tokio::test]
    async fn test_copy_from_str_parses_both_sides() {
        let file = local_fixture(b"png bytes");
        let source = file.path().to_str().unwrap().to_string();

        let mut seq = Sequence::new();
        let mut backend = MockStorageBackend::new();
        backend
            .expect_create_bucket()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        backend
            .expect_upload_file()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|target, _| target.bucket == "media" && target.key == "logo.png")
            .returning(|_, _| Ok(()));

        let storage = storage_with(Provider::Gcs, backend);
        storage
            .copy_from_str(&source, "gs://media/logo.png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_objects_from_str_rejects_local_paths() {
        let file = local_fixture(b"x");
        let storage = Storage::new();
        let result = storage
            .list_objects_from_str(file.path().to_str().unwrap())
            .await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
