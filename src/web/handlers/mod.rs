//! API handlers for the HTTP API.

pub mod file;

pub use file::*;

use std::path::PathBuf;

use crate::config::FilesConfig;
use crate::file::{ArchiveExporter, UploadRoot, DEFAULT_MAX_UPLOAD_SIZE};
use crate::Result;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Upload root.
    pub storage: UploadRoot,
    /// Directory for transient export archives.
    pub temp_dir: PathBuf,
    /// Include hidden entries in exports.
    pub export_hidden: bool,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state over an upload root.
    pub fn new(storage: UploadRoot) -> Self {
        Self {
            storage,
            temp_dir: std::env::temp_dir(),
            export_hidden: false,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Create the application state from the files configuration.
    ///
    /// The upload root is created if it doesn't exist.
    pub fn from_config(config: &FilesConfig) -> Result<Self> {
        let storage = UploadRoot::new(&config.upload_dir)?;
        tracing::info!("Upload root initialized at: {}", config.upload_dir);

        Ok(Self::new(storage)
            .with_temp_dir(config.temp_dir_path())
            .with_export_hidden(config.export_hidden)
            .with_max_upload_size(config.max_upload_size_bytes()))
    }

    /// Set the directory for export archives.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Set whether exports include hidden entries.
    pub fn with_export_hidden(mut self, export_hidden: bool) -> Self {
        self.export_hidden = export_hidden;
        self
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_upload_size(mut self, max_upload_size: u64) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    /// Exporter for the upload root.
    pub fn exporter(&self) -> ArchiveExporter {
        ArchiveExporter::new(self.storage.base_path(), &self.temp_dir)
            .include_hidden(self.export_hidden)
    }
}
