//! Credential file management
//!
//! Credentials are stored in TOML at ~/.config/ostor/credentials.toml:
//!
//! ```toml
//! [s3]
//! access_key = "..."
//! secret_key = "..."
//!
//! [gcs]
//! credentials_file = "/path/to/service-account.json"
//! project_id = "my-project"
//! ```

use std::path::PathBuf;

use ostor_core::{Error, Result};

use crate::credentials::CredentialsHolder;

/// Loads and saves the credential file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with the default credential file path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Configuration("could not determine config directory".into())
        })?;
        let config_path = config_dir.join("ostor").join("credentials.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the credential file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load credentials from disk
    pub fn load(&self) -> Result<CredentialsHolder> {
        if !self.config_path.exists() {
            return Err(Error::NotFound(format!(
                "credential file {} does not exist",
                self.config_path.display()
            )));
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Configuration(format!(
                "malformed credential file {}: {e}",
                self.config_path.display()
            ))
        })
    }

    /// Save credentials to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, credentials: &CredentialsHolder) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(credentials)
            .map_err(|e| Error::Configuration(e.to_string()))?;
        std::fs::write(&self.config_path, content)?;

        // Restrictive permissions on Unix systems: the file holds secrets
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }
}
