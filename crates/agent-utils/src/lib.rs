//! Shared utilities for the war room workspace
//!
//! Logging setup and the environment-derived configuration every binary
//! reads before anything else.

pub mod config;
pub mod logging;

pub use config::EnvConfig;
pub use logging::{LogFormat, init_tracing};
