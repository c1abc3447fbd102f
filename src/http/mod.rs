//! HTTP server module.
//!
//! The server includes:
//! - Graceful shutdown on SIGTERM/SIGINT
//! - Catalog hot-reload via SIGHUP

mod server;
mod shutdown;

pub use server::{bind_address, start_server, ServerError};
