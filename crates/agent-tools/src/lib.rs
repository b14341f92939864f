//! Tool framework for war room agents
//!
//! A [`Tool`] is a named, schema-described function the model can call. The
//! [`ToolRegistry`] keeps tools in registration order so the definitions sent
//! to the model are stable from one request to the next.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::Tool;
