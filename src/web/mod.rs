//! HTTP API module for Filedrop.
//!
//! This module exposes the upload root over HTTP: listings, single-file and
//! whole-tree downloads, uploads, and static read-only access.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
