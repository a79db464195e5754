//! Configuration management
//!
//! TOML-backed client configuration: where the session lives, how workspace
//! URLs are formed, and how the REST backend is reached.

use crate::error::{ErrorContext, SysoraError, SysoraResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "SYSORA_CONFIG";

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SysoraConfig {
    pub session: SessionStorageConfig,
    pub workspace: WorkspaceConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Where and under which keys the session is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStorageConfig {
    /// Prefix for every persisted key (`<prefix>_token`, ...)
    pub key_prefix: String,
    /// Directory used by the file-backed store
    pub storage_dir: PathBuf,
}

impl Default for SessionStorageConfig {
    fn default() -> Self {
        let storage_dir = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("sysora");

        Self {
            key_prefix: "sysora".to_string(),
            storage_dir,
        }
    }
}

/// Tenant workspace addressing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub scheme: String,
    /// Parent domain; workspaces live at `<subdomain>.<domain>`
    pub domain: String,
    /// Post-login landing path, receives `?subdomain=<subdomain>`
    pub dashboard_path: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            domain: "sysora.app".to_string(),
            dashboard_path: "/dashboard".to_string(),
        }
    }
}

/// REST backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_seconds: 30,
            user_agent: "sysora-client/0.1".to_string(),
        }
    }
}

impl SysoraConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SysoraResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SysoraError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: SysoraConfig = toml::from_str(&content).map_err(|e| SysoraError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `SYSORA_CONFIG` if set, defaults otherwise
    pub fn from_env_or_default() -> SysoraResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SysoraResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SysoraError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| SysoraError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SysoraResult<()> {
        let prefix = &self.session.key_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid(
                "session.key_prefix must be non-empty and contain only [A-Za-z0-9_]",
                "Set session.key_prefix to a value such as \"sysora\"",
            ));
        }

        if self.workspace.domain.is_empty() || self.workspace.domain.starts_with('.') {
            return Err(invalid(
                "workspace.domain must be a bare domain name",
                "Set workspace.domain to a value such as \"sysora.app\"",
            ));
        }

        if !matches!(self.workspace.scheme.as_str(), "http" | "https") {
            return Err(invalid(
                "workspace.scheme must be http or https",
                "Set workspace.scheme to \"https\"",
            ));
        }

        if !self.workspace.dashboard_path.starts_with('/') {
            return Err(invalid(
                "workspace.dashboard_path must start with '/'",
                "Set workspace.dashboard_path to a value such as \"/dashboard\"",
            ));
        }

        url::Url::parse(&self.api.base_url).map_err(|e| SysoraError::Config {
            message: format!("api.base_url is not a valid URL: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("validate"),
        })?;

        if self.api.timeout_seconds == 0 {
            return Err(invalid(
                "api.timeout_seconds must be greater than 0",
                "Set api.timeout_seconds to a positive value",
            ));
        }

        Ok(())
    }
}

fn invalid(message: &str, suggestion: &str) -> SysoraError {
    SysoraError::Config {
        message: message.to_string(),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("validate")
            .with_suggestion(suggestion),
    }
}
