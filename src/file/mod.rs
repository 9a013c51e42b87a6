//! File management module for Filedrop.
//!
//! This module provides the filesystem side of the server:
//! - The upload root and upload persistence
//! - Recursive listing with hidden-entry exclusion
//! - Zip export of the whole upload root

mod archive;
mod storage;
mod walker;

pub use archive::{ArchiveArtifact, ArchiveExporter, ArchiveStream, COMPRESSION_LEVEL};
pub use storage::{StoredFile, UploadRoot};
pub use walker::{
    is_hidden, relative_path, Entries, Entry, Files, RelativeFiles, Walker, HIDDEN_MARKER,
};

/// Default maximum upload size (100MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;
