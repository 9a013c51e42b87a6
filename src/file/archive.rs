//! Zip export of the upload root.
//!
//! An export runs in two ordered stages. [`ArchiveExporter::export`] writes
//! and finalizes the whole archive into a uniquely named temporary file
//! (blocking, meant for `spawn_blocking`). [`ArchiveArtifact::into_stream`]
//! then turns the finished file into a byte stream for the response body.
//! The temporary file is removed when that stream is dropped, whether the
//! transmission completed or not.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use futures::Stream;
use tempfile::{NamedTempFile, TempPath};
use tokio_util::io::ReaderStream;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::walker::{relative_path, Walker};
use crate::Result;

/// Deflate level used for every archive member.
pub const COMPRESSION_LEVEL: i64 = 9;

/// Builds zip snapshots of a directory tree.
#[derive(Debug, Clone)]
pub struct ArchiveExporter {
    root: PathBuf,
    temp_dir: PathBuf,
    include_hidden: bool,
}

impl ArchiveExporter {
    /// Create an exporter for `root` writing artifacts into `temp_dir`.
    pub fn new(root: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temp_dir: temp_dir.into(),
            include_hidden: false,
        }
    }

    /// Include hidden entries in the archive.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Write a finalized archive of the root to a new temporary file.
    ///
    /// Member names are relative to the root. Directories become directory
    /// members so empty folders survive. On error the partial file is removed
    /// before returning.
    pub fn export(&self) -> Result<ArchiveArtifact> {
        std::fs::create_dir_all(&self.temp_dir)?;

        let prefix = format!("filedrop-export-{}-", Uuid::new_v4());
        let temp_file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".zip")
            .tempfile_in(&self.temp_dir)?;

        let mut zip = ZipWriter::new(temp_file);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL))
            .unix_permissions(0o644);

        let dir_options = options.unix_permissions(0o755);

        let walker = Walker::new(&self.root)
            .include_hidden(self.include_hidden)
            .include_dirs(true);
        let mut entries = 0;

        for entry in walker.entries() {
            let entry = entry?;
            let Some(name) = relative_path(&self.root, entry.path()) else {
                continue;
            };

            if entry.is_dir() {
                zip.add_directory(name.as_str(), dir_options)?;
            } else {
                zip.start_file(name.as_str(), options)?;
                let mut source = File::open(entry.path())?;
                io::copy(&mut source, &mut zip)?;
                entries += 1;
            }

            tracing::trace!(member = %name, "Added archive member");
        }

        let temp_file: NamedTempFile = zip.finish()?;
        let size = temp_file.as_file().metadata()?.len();
        let path = temp_file.into_temp_path();

        tracing::debug!(
            path = %path.display(),
            entries,
            size,
            "Archive finalized"
        );

        Ok(ArchiveArtifact {
            path,
            size,
            entries,
        })
    }
}

/// A finalized archive waiting to be transmitted.
///
/// Dropping the artifact removes the file.
#[derive(Debug)]
pub struct ArchiveArtifact {
    path: TempPath,
    size: u64,
    entries: usize,
}

impl ArchiveArtifact {
    /// Location of the archive on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of file members, not counting directories.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Open the archive as a byte stream that owns the temporary file.
    pub async fn into_stream(self) -> Result<ArchiveStream> {
        let file = tokio::fs::File::open(&self.path).await?;

        Ok(ArchiveStream {
            inner: ReaderStream::new(file),
            artifact: Some(self.path),
            finished: false,
        })
    }
}

/// Response body stream over an archive artifact.
pub struct ArchiveStream {
    inner: ReaderStream<tokio::fs::File>,
    artifact: Option<TempPath>,
    finished: bool,
}

impl Stream for ArchiveStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Err(e))) => {
                tracing::error!(error = %e, "Archive transmission failed");
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl Drop for ArchiveStream {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Archive stream dropped before transmission completed");
        }

        if let Some(path) = self.artifact.take() {
            let shown = path.display().to_string();
            match path.close() {
                Ok(()) => tracing::debug!(path = %shown, "Removed archive artifact"),
                Err(e) => {
                    tracing::warn!(path = %shown, error = %e, "Failed to remove archive artifact")
                }
            }
        }
    }
}
