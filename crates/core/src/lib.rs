//! ostor-core: provider-agnostic storage locations and copy orchestration
//!
//! This crate provides the core functionality for ostor, including:
//! - Storage location descriptors (local paths and remote objects/buckets)
//! - Parsing of location strings (AWS and GCS URL dialects, local fallback)
//! - The StorageBackend trait implemented once per provider
//! - The copy orchestrator selecting and sequencing transfer strategies
//!
//! This crate is independent of any specific provider SDK, allowing the
//! orchestrator to be tested against mock backends and new providers to be
//! added without touching the core.

pub mod backend;
pub mod copy;
pub mod error;
pub mod location;
pub mod parse;

pub use backend::{ByteStream, StorageBackend};
pub use copy::Storage;
pub use error::{Error, Result};
pub use location::{Provider, RemoteObject, StorageLocation};
pub use parse::parse_location;
