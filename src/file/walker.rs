//! Recursive tree walker over the upload root.
//!
//! The walker is lazy: it only keeps the open directory handles along the
//! current path, so listing a deep tree does not materialize it in memory.
//! Entries within a directory are visited in file-name order, depth first.
//!
//! ```text
//! uploads/
//! ├── .hidden/secret.txt   (skipped, with its whole subtree)
//! ├── a.txt                -> "a.txt"
//! └── sub/
//!     ├── .env             (skipped)
//!     └── b.txt            -> "sub/b.txt"
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::Result;

/// Marker that makes a file or directory hidden.
pub const HIDDEN_MARKER: char = '.';

/// Check whether a file or directory name is hidden.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with(HIDDEN_MARKER)
}

/// Render `path` relative to `root` with `/` separators.
///
/// Returns `None` when `path` is not below `root` or a component below the
/// root is not valid UTF-8.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

fn has_utf8_name(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || entry.file_name().to_str().is_some() {
        return true;
    }
    tracing::warn!(path = %entry.path().display(), "Skipping entry with a non UTF-8 name");
    false
}

fn keep_visible(entry: &DirEntry) -> bool {
    // The walk root is never subject to the hidden rule.
    has_utf8_name(entry) && (entry.depth() == 0 || !is_hidden(entry.file_name()))
}

fn keep_all(entry: &DirEntry) -> bool {
    has_utf8_name(entry)
}

/// Restartable description of a walk over a directory tree.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    include_hidden: bool,
    include_dirs: bool,
}

impl Walker {
    /// Create a walker rooted at `root` that skips hidden entries.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_hidden: false,
            include_dirs: false,
        }
    }

    /// Also descend into and report hidden entries.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Also report directories below the root from [`Walker::entries`].
    pub fn include_dirs(mut self, include: bool) -> Self {
        self.include_dirs = include;
        self
    }

    /// Start a new walk yielding regular files and, if enabled, directories.
    ///
    /// A directory is yielded before its contents.
    pub fn entries(&self) -> Entries {
        let filter: fn(&DirEntry) -> bool = if self.include_hidden {
            keep_all
        } else {
            keep_visible
        };

        let inner = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(filter);

        Entries {
            inner,
            include_dirs: self.include_dirs,
        }
    }

    /// Start a new walk yielding the full path of every regular file.
    pub fn files(&self) -> Files {
        let mut entries = self.entries();
        entries.include_dirs = false;
        Files { entries }
    }

    /// Start a new walk yielding each regular file relative to the root.
    pub fn relative_files(&self) -> RelativeFiles {
        RelativeFiles {
            root: self.root.clone(),
            files: self.files(),
        }
    }
}

/// A file or directory reported by [`Walker::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: PathBuf,
    is_dir: bool,
}

impl Entry {
    /// Full path of the entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Iterator produced by [`Walker::entries`].
pub struct Entries {
    inner: FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>,
    include_dirs: bool,
}

impl Iterator for Entries {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) if entry.file_type().is_file() => {
                    return Some(Ok(Entry {
                        path: entry.into_path(),
                        is_dir: false,
                    }));
                }
                Ok(entry) if self.include_dirs && entry.depth() > 0 && entry.file_type().is_dir() => {
                    return Some(Ok(Entry {
                        path: entry.into_path(),
                        is_dir: true,
                    }));
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Iterator over full file paths produced by [`Walker::files`].
pub struct Files {
    entries: Entries,
}

impl Iterator for Files {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.entries.next()?.map(Entry::into_path))
    }
}

/// Iterator over root-relative file paths produced by [`Walker::relative_files`].
pub struct RelativeFiles {
    root: PathBuf,
    files: Files,
}

impl Iterator for RelativeFiles {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = match self.files.next()? {
                Ok(path) => path,
                Err(e) => return Some(Err(e)),
            };
            if let Some(relative) = relative_path(&self.root, &path) {
                return Some(Ok(relative));
            }
        }
    }
}
