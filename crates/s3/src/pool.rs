//! S3 credentials and region-keyed client pool
//!
//! S3 clients are bound to a region at construction time, while locations
//! carry their region as data. The pool owns one client per region,
//! building each lazily from a single static credential set. Its lifetime
//! is that of the owning [`S3Backend`](crate::S3Backend); there is no
//! process-wide shared client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use ostor_core::Provider;

/// Static AWS credentials plus optional endpoint override
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Credentials {
    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Session token for temporary credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Custom endpoint URL for S3-compatible backends; implies
    /// path-style addressing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl S3Credentials {
    /// Create a credential set with required fields
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: None,
            endpoint: None,
        }
    }
}

/// One owned S3 client per region, built on first use
pub struct ClientPool {
    credentials: S3Credentials,
    clients: RwLock<HashMap<String, aws_sdk_s3::Client>>,
}

impl ClientPool {
    /// Create an empty pool for a credential set
    pub fn new(credentials: S3Credentials) -> Self {
        Self {
            credentials,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Get the client for a region, building it if needed.
    ///
    /// An empty region resolves to the provider default.
    pub async fn client(&self, region: &str) -> aws_sdk_s3::Client {
        let region = if region.is_empty() {
            Provider::Aws.default_region()
        } else {
            region
        };

        if let Some(client) = self.clients.read().await.get(region) {
            return client.clone();
        }

        let built = self.build(region).await;
        self.clients
            .write()
            .await
            .entry(region.to_string())
            .or_insert(built)
            .clone()
    }

    async fn build(&self, region: &str) -> aws_sdk_s3::Client {
        let credentials = aws_credential_types::Credentials::new(
            self.credentials.access_key.clone(),
            self.credentials.secret_key.clone(),
            self.credentials.session_token.clone(),
            None, // expiry
            "ostor-static-credentials",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(region.to_string()));

        if let Some(endpoint) = &self.credentials.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;

        // Path-style addressing for S3-compatible backends behind a
        // custom endpoint
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(self.credentials.endpoint.is_some())
            .build();

        aws_sdk_s3::Client::from_conf(s3_config)
    }
}
