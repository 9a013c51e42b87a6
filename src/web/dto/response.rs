//! Response DTOs for the Filedrop HTTP API.

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::file::StoredFile;

/// Metadata of a stored file.
#[derive(Debug, Serialize)]
pub struct StoredFileResponse {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Path relative to the upload root.
    pub path: String,
    /// Destination folder relative to the upload root.
    pub folder: String,
    /// Last modification time (RFC 3339).
    pub modified: String,
}

impl From<StoredFile> for StoredFileResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            modified: to_rfc3339(&file.modified),
            name: file.name,
            size: file.size,
            path: file.path,
            folder: file.folder,
        }
    }
}

/// Upload response.
#[derive(Debug, Serialize)]
pub struct FileUploadResponse {
    /// Status message.
    pub message: String,
    /// Stored file.
    pub file: StoredFileResponse,
}

impl FileUploadResponse {
    /// Create a response for a successfully stored file.
    pub fn new(file: StoredFile) -> Self {
        Self {
            message: "File uploaded successfully".to_string(),
            file: file.into(),
        }
    }
}
