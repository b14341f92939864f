//! Core abstractions shared by the war room crates
//!
//! This crate defines the [`Agent`] trait, the per-request [`Context`] and the
//! error type every agent-facing layer converts into.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};
