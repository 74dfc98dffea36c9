//! Location string parsing
//!
//! Turns an opaque location string into a [`StorageLocation`]. Three
//! dialects are recognized, in order:
//!
//! 1. AWS object URL: `https://<bucket>.s3[.<region>].amazonaws.com[/<key>]`
//! 2. GCS URL: `gs://<bucket>[/<key>]` or
//!    `https://storage.cloud.google.com/<bucket>[/<key>]`
//! 3. Local filesystem path (fallback; must exist on disk)
//!
//! URL extraction is positional slicing over the dialect grammar, not full
//! URI parsing. Parsing never touches the network; only the local fallback
//! checks the filesystem.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::location::{Provider, RemoteObject, StorageLocation};

const HTTPS_PREFIX: &str = "https://";
const AWS_HOST_MARKER: &str = ".s3.";
const AWS_HOST_SUFFIX: &str = "amazonaws.com";
const GCS_SCHEME_PREFIX: &str = "gs://";
const GCS_HOST_MARKER: &str = "storage.cloud.google.com";
const GCS_HOST_PREFIX: &str = "https://storage.cloud.google.com/";

/// Parse a location string into a [`StorageLocation`]
///
/// Total over any input: every string either parses or yields an error.
/// A string matching neither URL dialect is treated as a local path and
/// must exist on disk.
pub fn parse_location(input: &str) -> Result<StorageLocation> {
    if is_aws_url(input) {
        parse_aws_url(input)
    } else if is_gcs_url(input) {
        parse_gcs_url(input)
    } else {
        parse_local_path(input)
    }
}

fn is_aws_url(input: &str) -> bool {
    input.starts_with(HTTPS_PREFIX) && input.contains(AWS_HOST_MARKER)
}

fn is_gcs_url(input: &str) -> bool {
    input.starts_with(GCS_SCHEME_PREFIX) || input.contains(GCS_HOST_MARKER)
}

/// Parse an AWS object URL.
///
/// The bucket is the subdomain before the first `.`; the region, when
/// present, sits between `.s3.` and the next `.`. A host that continues
/// directly with `amazonaws.com` carries no region segment and resolves
/// to the default region.
fn parse_aws_url(input: &str) -> Result<StorageLocation> {
    let invalid = || Error::InvalidLocation(format!("malformed AWS object URL: {input}"));

    let host = input.strip_prefix(HTTPS_PREFIX).ok_or_else(invalid)?;
    let dot = host.find('.').ok_or_else(invalid)?;
    let bucket = &host[..dot];
    if bucket.is_empty() {
        return Err(invalid());
    }

    let rest = host[dot + 1..].strip_prefix("s3.").ok_or_else(invalid)?;
    let (region, rest) = if let Some(rest) = rest.strip_prefix(AWS_HOST_SUFFIX) {
        // No region segment in the host
        (Provider::Aws.default_region().to_string(), rest)
    } else {
        let dot = rest.find('.').ok_or_else(invalid)?;
        let region = rest[..dot].to_string();
        let rest = rest[dot + 1..]
            .strip_prefix(AWS_HOST_SUFFIX)
            .ok_or_else(invalid)?;
        (region, rest)
    };

    let key = rest.strip_prefix('/').unwrap_or(rest);

    Ok(StorageLocation::Remote(
        RemoteObject::new(Provider::Aws, bucket, key).with_region(region),
    ))
}

/// Parse a GCS URL in either the `gs://` short form or the
/// `https://storage.cloud.google.com/` long form.
fn parse_gcs_url(input: &str) -> Result<StorageLocation> {
    let invalid = || Error::InvalidLocation(format!("malformed GCS URL: {input}"));

    let rest = if let Some(rest) = input.strip_prefix(GCS_SCHEME_PREFIX) {
        rest
    } else {
        input.strip_prefix(GCS_HOST_PREFIX).ok_or_else(invalid)?
    };

    // No separator after the bucket means the whole bucket
    let (bucket, key) = match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos + 1..]),
        None => (rest, ""),
    };
    if bucket.is_empty() {
        return Err(invalid());
    }

    Ok(StorageLocation::Remote(RemoteObject::new(
        Provider::Gcs,
        bucket,
        key,
    )))
}

/// Fallback: treat the string as a local path, requiring it to exist.
fn parse_local_path(input: &str) -> Result<StorageLocation> {
    if !Path::new(input).exists() {
        return Err(Error::NotFound(format!(
            "no such local file or directory: {input}"
        )));
    }
    Ok(StorageLocation::Local(PathBuf::from(input)))
}
