//! ostor-s3: AWS backend for ostor
//!
//! This crate implements the StorageBackend trait from ostor-core using
//! aws-sdk-s3. It is the only crate that directly depends on the AWS SDK.

pub mod backend;
pub mod pool;

pub use backend::S3Backend;
pub use pool::{ClientPool, S3Credentials};
