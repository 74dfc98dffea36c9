//! ostor-gcs: Google Cloud Storage backend for ostor
//!
//! This crate implements the StorageBackend trait from ostor-core using
//! the google-cloud-storage crate. It is the only crate that directly
//! depends on the Google Cloud SDK.

pub mod backend;

pub use backend::{GcsBackend, GcsCredentials};
