//! Credential bundling
//!
//! One credential set per supported provider, threaded into backend
//! construction. The core never inspects the contents.

use serde::{Deserialize, Serialize};

use ostor_gcs::GcsCredentials;
use ostor_s3::S3Credentials;

/// Credentials for every supported provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsHolder {
    /// AWS credentials
    pub s3: S3Credentials,

    /// Google Cloud credentials
    pub gcs: GcsCredentials,
}
