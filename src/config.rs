//! Configuration module for Filedrop.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{FiledropError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins (empty allows any origin).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Upload directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the upload root directory.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Include hidden entries in `/download-all` archives.
    #[serde(default)]
    pub export_hidden: bool,
    /// Directory for transient export archives (empty = OS temp dir).
    #[serde(default)]
    pub temp_dir: String,
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl FilesConfig {
    /// Maximum upload size in bytes, saturating at `u64::MAX`.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    /// Resolved directory for export archives.
    pub fn temp_dir_path(&self) -> PathBuf {
        if self.temp_dir.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.temp_dir)
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_upload_size_mb: default_max_upload_size(),
            export_hidden: false,
            temp_dir: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file (empty disables file logging).
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filedrop.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload directory configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FiledropError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FiledropError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEDROP_UPLOAD_DIR`: Override the upload root directory
    /// - `FILEDROP_PORT`: Override the listen port
    /// - `FILEDROP_LOG_LEVEL`: Override the log level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FILEDROP_UPLOAD_DIR") {
            if !dir.is_empty() {
                self.files.upload_dir = dir;
            }
        }

        if let Ok(port) = std::env::var("FILEDROP_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => eprintln!("Ignoring invalid FILEDROP_PORT: {port}"),
            }
        }

        if let Ok(level) = std::env::var("FILEDROP_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(FiledropError::Config("server.port must not be 0".to_string()));
        }
        if self.files.upload_dir.trim().is_empty() {
            return Err(FiledropError::Config(
                "files.upload_dir must not be empty".to_string(),
            ));
        }
        if self.files.max_upload_size_mb == 0 {
            return Err(FiledropError::Config(
                "files.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
