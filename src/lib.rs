//! Cadenza companion server library
//!
//! This library exposes the internal modules for testing and for the client.

pub mod account;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod playlist;
pub mod profile;
pub mod server;
pub mod sqlite_persistence;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{CompanionError, CompanionResult};
pub use server::{run_server, RequestsLoggingLevel};
pub use store::{FullStore, SqliteCompanionStore};
