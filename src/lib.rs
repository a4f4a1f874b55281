//! Job Tracker Server Library
//!
//! Exposes the internal modules for the binary and the end-to-end tests.

pub mod config;
pub mod job_store;
pub mod jobs;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use job_store::{JobStore, SqliteJobStore};
pub use jobs::{JobQueryEngine, QuerySettings};
pub use server::{run_server, RequestsLoggingLevel};
