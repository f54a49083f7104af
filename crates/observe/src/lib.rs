//! Observability setup shared by the dashboard binaries and tests: log
//! subscriber initialisation and a panic hook that routes panics through
//! `tracing`.
pub mod config;
pub mod tracing;

pub use config::Config;
