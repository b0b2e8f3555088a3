//! # CinderKV Server
//!
//! The HTTP/JSON API over the CinderKV storage engine.
//!
//! Endpoints:
//!
//! | Method + Path | Action |
//! |---|---|
//! | `GET /{kind}/{key}` | typed read, kind in {collection,table,zset,text,number,set} |
//! | `PUT /{kind}/{key}` | typed write, JSON body |
//! | `DELETE /{kind}/{key}` | delete |
//! | `GET /query/{key}` | raw read: kind, value bytes, TTL, MVCC tag |
//! | `GET /health` | engine introspection |
//!
//! Every response body is JSON; errors are `{"message": ...}`. A shared
//! token in the `Authorization` header guards every route, and an optional
//! client-IP whitelist can narrow it further. The engine handle and the
//! options are explicit values carried in [`AppState`] - there is no
//! process-wide storage global.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
mod server;

pub use config::{
    CheckpointOptions, CompressorOptions, EncryptorOptions, RegionOptions, ServerOptions,
};
pub use error::{ServerError, ServerResult};
pub use server::{bind, router, serve};

use cinderkv_core::LogStore;
use std::sync::Arc;

/// Shared state carried by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The storage engine.
    pub store: Arc<LogStore>,
    /// The effective server options.
    pub options: Arc<ServerOptions>,
}

impl AppState {
    /// Creates the state from an opened engine and validated options.
    #[must_use]
    pub fn new(store: Arc<LogStore>, options: Arc<ServerOptions>) -> Self {
        Self { store, options }
    }
}
