//! Upload root storage for Filedrop.
//!
//! This module owns the single upload directory:
//! - Resolving caller-supplied relative paths inside the root
//! - Creating destination folders on upload
//! - Saving payloads under their original filename
//! - Looking up stored files for download

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use super::walker::{relative_path, Walker};
use crate::{FiledropError, Result};

/// Metadata of a file stored under the upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// File name as supplied by the client.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Path relative to the upload root, `/` separated.
    pub path: String,
    /// Destination folder relative to the upload root (empty for the root).
    pub folder: String,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// The upload root directory.
///
/// All files and folders managed by the server live below this path:
/// ```text
/// {base_path}/
/// ├── report.pdf
/// └── projects/
///     └── 2024/
///         └── notes.txt
/// ```
#[derive(Debug, Clone)]
pub struct UploadRoot {
    /// Base directory for stored files.
    base_path: PathBuf,
}

impl UploadRoot {
    /// Open the upload root at the given path.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of the upload root.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Walker over the visible files of the upload root.
    pub fn walker(&self) -> Walker {
        Walker::new(&self.base_path)
    }

    /// List every visible file relative to the root.
    pub fn list_files(&self) -> Result<Vec<String>> {
        self.walker().relative_files().collect()
    }

    /// Split a caller-supplied relative path into safe segments.
    ///
    /// Both `/` and `\` separate segments. Empty and `.` segments are dropped.
    /// `..`, absolute paths and drive prefixes are rejected.
    pub fn split_segments(relative: &str) -> Result<Vec<String>> {
        let mut segments = Vec::new();

        for part in relative.split(['/', '\\']) {
            if part.is_empty() {
                if segments.is_empty() && relative.starts_with(['/', '\\']) {
                    return Err(FiledropError::Validation(format!(
                        "absolute path not allowed: {relative}"
                    )));
                }
                continue;
            }

            match Path::new(part).components().next() {
                Some(Component::Normal(_)) => segments.push(part.to_string()),
                Some(Component::CurDir) => {}
                _ => {
                    return Err(FiledropError::Validation(format!(
                        "path escapes upload root: {relative}"
                    )));
                }
            }
        }

        Ok(segments)
    }

    /// Resolve a caller-supplied relative path to a location inside the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let segments = Self::split_segments(relative)?;
        Ok(segments
            .iter()
            .fold(self.base_path.clone(), |path, segment| path.join(segment)))
    }

    /// Reduce a client-supplied filename to its final path component.
    pub fn sanitize_filename(filename: &str) -> Result<String> {
        let name = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();

        if name.is_empty() || name == "." || name == ".." {
            return Err(FiledropError::Validation(format!(
                "invalid filename: {filename:?}"
            )));
        }

        Ok(name.to_string())
    }

    /// Save content under `folder` using the client's filename.
    ///
    /// Missing folders are created. An existing file with the same name is
    /// overwritten.
    pub fn save(&self, folder: Option<&str>, filename: &str, content: &[u8]) -> Result<StoredFile> {
        let name = Self::sanitize_filename(filename)?;
        let folder_segments = Self::split_segments(folder.unwrap_or_default())?;

        let dir = folder_segments
            .iter()
            .fold(self.base_path.clone(), |path, segment| path.join(segment));
        fs::create_dir_all(&dir)?;

        let file_path = dir.join(&name);
        fs::write(&file_path, content)?;

        let metadata = fs::metadata(&file_path)?;
        let modified = metadata.modified().map(DateTime::<Utc>::from)?;

        Ok(StoredFile {
            path: relative_path(&self.base_path, &file_path).unwrap_or_else(|| name.clone()),
            name,
            size: metadata.len(),
            folder: folder_segments.join("/"),
            modified,
        })
    }

    /// Look up a stored regular file for download.
    ///
    /// Returns `NotFound` when the path is rejected, missing, or not a regular
    /// file. Symbolic links are not followed.
    pub fn file_path(&self, relative: &str) -> Result<PathBuf> {
        let not_found = || FiledropError::NotFound(format!("File: {relative}"));

        let path = self.resolve(relative).map_err(|_| not_found())?;

        match fs::symlink_metadata(&path) {
            Ok(m) if m.is_file() => Ok(path),
            Ok(_) => Err(not_found()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }
}
