//! Translation settings
//!
//! Conventions translators apply to every generated service. Loaded from an
//! optional YAML file; every field has a default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid setting {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Settings shared by all translators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationSettings {
    /// Network every generated service joins
    #[serde(default = "default_network")]
    pub network: String,
    /// Base domain for reverse-proxy host rules
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Host directory for bind-mounted data
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Emit Traefik routing labels on HTTP services
    #[serde(default = "default_true")]
    pub traefik_labels: bool,
    /// Restart policy for long-running services
    #[serde(default = "default_restart_policy")]
    pub default_restart_policy: String,
}

fn default_network() -> String {
    "cloudport".to_string()
}

fn default_domain() -> String {
    "localhost".to_string()
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_true() -> bool {
    true
}

fn default_restart_policy() -> String {
    "unless-stopped".to_string()
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            network: default_network(),
            domain: default_domain(),
            data_root: default_data_root(),
            traefik_labels: default_true(),
            default_restart_policy: default_restart_policy(),
        }
    }
}

const RESTART_POLICIES: [&str; 4] = ["no", "always", "on-failure", "unless-stopped"];

impl TranslationSettings {
    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_yaml::from_str(yaml)
            .map_err(|e| SettingsError::ParseError(format!("Failed to parse YAML: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file path
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::IoError(format!("Failed to read file {:?}: {}", path, e))
        })?;
        let settings = Self::from_yaml(&content)?;
        debug!("Loaded translation settings from {:?}", path);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.network.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "network".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if !RESTART_POLICIES.contains(&self.default_restart_policy.as_str()) {
            return Err(SettingsError::Invalid {
                key: "default_restart_policy".to_string(),
                message: format!(
                    "'{}' is not one of {}",
                    self.default_restart_policy,
                    RESTART_POLICIES.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// Host path for a service's data directory
    pub fn data_path(&self, service: &str) -> String {
        format!("{}/{}", self.data_root.trim_end_matches('/'), service)
    }

    /// Fully qualified host name for a service
    pub fn host_for(&self, service: &str) -> String {
        format!("{}.{}", service, self.domain)
    }
}
