//! Filedrop - a minimal file hosting server.
//!
//! Serves a single upload directory over HTTP: recursive listings that skip
//! hidden entries, multipart uploads into nested folders, single-file
//! downloads, and zip export of the whole tree.

pub mod config;
pub mod datetime;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{FiledropError, Result};
pub use file::{ArchiveExporter, StoredFile, UploadRoot, Walker};
pub use web::WebServer;
