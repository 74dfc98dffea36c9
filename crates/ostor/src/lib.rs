//! ostor: provider-agnostic object storage copy orchestration
//!
//! A single vocabulary for manipulating objects on local disk, AWS S3 and
//! Google Cloud Storage, and for moving them between any two locations:
//! local to remote, remote to local, and remote to remote within or across
//! providers (the latter staged through a local temporary file).
//!
//! ```no_run
//! use ostor::{ConfigManager, connect};
//!
//! # async fn run() -> ostor::Result<()> {
//! let credentials = ConfigManager::new()?.load()?;
//! let storage = connect(credentials).await?;
//!
//! storage
//!     .copy_from_str(
//!         "https://reports.s3.eu-central-1.amazonaws.com/2024/summary.csv",
//!         "gs://archive/2024/summary.csv",
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod config;
pub mod credentials;

pub use ostor_core::{
    ByteStream, Error, Provider, RemoteObject, Result, Storage, StorageBackend, StorageLocation,
    parse_location,
};
pub use ostor_gcs::{GcsBackend, GcsCredentials};
pub use ostor_s3::{S3Backend, S3Credentials};

pub use config::ConfigManager;
pub use credentials::CredentialsHolder;

/// Build a [`Storage`] with a backend registered for every supported
/// provider
pub async fn connect(credentials: CredentialsHolder) -> Result<Storage> {
    let mut storage = Storage::new();
    storage.register(Provider::Aws, Arc::new(S3Backend::new(credentials.s3)));
    storage.register(
        Provider::Gcs,
        Arc::new(GcsBackend::new(credentials.gcs).await?),
    );
    Ok(storage)
}
