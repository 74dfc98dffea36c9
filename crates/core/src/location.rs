//! Storage location descriptors
//!
//! A location is either a local filesystem path or a remote object/bucket
//! reference on one of the supported providers. Descriptors are immutable
//! value objects; bucket iteration derives new ones via [`RemoteObject::with_key`].

use std::path::PathBuf;

/// A concrete object-storage provider.
///
/// Closed set, known at build time. Adding a provider means adding an
/// enum value and a backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Amazon S3
    Aws,
    /// Google Cloud Storage
    Gcs,
}

impl Provider {
    /// The provider's documented default region, used when a location
    /// carries no region hint.
    pub const fn default_region(&self) -> &'static str {
        match self {
            Provider::Aws => "us-east-1",
            Provider::Gcs => "US",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Aws => write!(f, "AWS"),
            Provider::Gcs => write!(f, "GCS"),
        }
    }
}

/// A remote object or bucket reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Provider hosting the bucket
    pub provider: Provider,
    /// Bucket name (never empty)
    pub bucket: String,
    /// Object key; empty means the whole bucket
    pub key: String,
    /// Region hint; empty means the provider default
    pub region: String,
}

impl RemoteObject {
    /// Create a new remote reference with no region hint
    pub fn new(provider: Provider, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            key: key.into(),
            region: String::new(),
        }
    }

    /// Set the region hint
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Derive a reference to another key in the same bucket
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            provider: self.provider,
            bucket: self.bucket.clone(),
            key: key.into(),
            region: self.region.clone(),
        }
    }

    /// Whether this reference addresses the whole bucket
    pub fn is_bucket_scope(&self) -> bool {
        self.key.is_empty()
    }

    /// The effective region: the hint if set, the provider default otherwise
    pub fn region_or_default(&self) -> &str {
        if self.region.is_empty() {
            self.provider.default_region()
        } else {
            &self.region
        }
    }
}

impl std::fmt::Display for RemoteObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}/{}", self.provider, self.bucket)
        } else {
            write!(f, "{}/{}/{}", self.provider, self.bucket, self.key)
        }
    }
}

/// A storage location: local file or remote object/bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// Local filesystem path
    Local(PathBuf),
    /// Remote object or bucket
    Remote(RemoteObject),
}

impl StorageLocation {
    /// Check if this is a local path
    pub fn is_local(&self) -> bool {
        matches!(self, StorageLocation::Local(_))
    }

    /// Check if this is a remote reference
    pub fn is_remote(&self) -> bool {
        matches!(self, StorageLocation::Remote(_))
    }

    /// Get the remote reference if this is a remote location
    pub fn as_remote(&self) -> Option<&RemoteObject> {
        match self {
            StorageLocation::Remote(r) => Some(r),
            StorageLocation::Local(_) => None,
        }
    }

    /// Get the local path if this is a local location
    pub fn as_local(&self) -> Option<&PathBuf> {
        match self {
            StorageLocation::Local(p) => Some(p),
            StorageLocation::Remote(_) => None,
        }
    }
}

impl From<RemoteObject> for StorageLocation {
    fn from(remote: RemoteObject) -> Self {
        StorageLocation::Remote(remote)
    }
}
