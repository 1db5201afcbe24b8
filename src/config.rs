//! Configuration management for tenantfs
//!
//! Loads `config.toml` with environment overrides (`TENANTFS__*`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::auth::{FILES_DIR_NAME, METADATA_FILE_NAME};
use crate::storage::PathComparison;
use crate::utils::try_parse_storage_limit;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Root directory holding every tenant's data
    pub storage_root: String,

    /// Case handling when checking that resolved paths stay under the root
    #[serde(default)]
    pub path_comparison: PathComparison,

    /// Storage limit for new users, e.g. `"1gb"` or `"500mb"`
    #[serde(default = "default_storage_limit")]
    pub default_storage_limit: String,

    /// Name of the metadata file inside each user directory
    #[serde(default = "default_metadata_file_name")]
    pub metadata_file_name: String,

    /// Admin account created at startup when missing
    #[serde(default)]
    pub bootstrap: Option<BootstrapAdmin>,
}

/// Initial admin account
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapAdmin {
    pub tenant: String,
    pub username: String,
    pub password: String,
}

fn default_storage_limit() -> String {
    "1gb".to_string()
}

fn default_metadata_file_name() -> String {
    METADATA_FILE_NAME.to_string()
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        // Packaged layout first, then the working directory
        let config_paths = ["tenantfs/config", "config"];

        let mut last_error = None;

        for config_path in config_paths {
            match Self::load_from(config_path) {
                Ok(config) => return Ok(config),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ConfigError::Message("no config path tried".into())))
    }

    /// Load from a specific file (extension optional) plus environment overrides
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(config_path))
            .add_source(Environment::with_prefix("TENANTFS").separator("__"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_root.trim().is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if try_parse_storage_limit(&self.default_storage_limit).is_none() {
            return Err(ConfigError::Message(format!(
                "default_storage_limit {:?} is not a valid size",
                self.default_storage_limit
            )));
        }

        if !crate::auth::is_valid_username(&self.metadata_file_name) {
            return Err(ConfigError::Message(format!(
                "metadata_file_name {:?} must be a plain file name",
                self.metadata_file_name
            )));
        }

        if self.metadata_file_name == FILES_DIR_NAME {
            return Err(ConfigError::Message(format!(
                "metadata_file_name {:?} collides with the user files directory",
                self.metadata_file_name
            )));
        }

        if let Some(bootstrap) = &self.bootstrap {
            if bootstrap.tenant.trim().is_empty()
                || bootstrap.username.trim().is_empty()
                || bootstrap.password.trim().is_empty()
            {
                return Err(ConfigError::Message(
                    "bootstrap tenant, username and password must all be set".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Default storage limit in bytes, `None` when the token does not parse
    pub fn default_storage_limit_bytes(&self) -> Option<u64> {
        try_parse_storage_limit(&self.default_storage_limit)
    }
}
