//! HTTP server for the Depot registry.
//!
//! Serves the module and provider registry protocols Terraform clients speak,
//! the publishing API used to create providers, versions, platforms, modules
//! and signing keys, and (on the local backend) artifact uploads and
//! downloads.
//!
//! # Status mapping
//!
//! - a missing resource is `404`
//! - malformed input and operations the backend cannot perform are `400`
//! - anything else is `500` with a generic body; the cause is only logged

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{LogConfig, LogFormat, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::DepotServer;
pub use state::AppState;
