//! Concrete agent implementations
//!
//! Tool-using research loops live in [`crate::executor`]; this module holds
//! the one-shot [`SimpleAgent`].

pub mod simple;

pub use simple::{SimpleAgent, SimpleConfig};
