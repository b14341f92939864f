//! Agent runtime
//!
//! This crate provides the [`AgentExecutor`] research loop, the one-shot
//! [`SimpleAgent`] and the [`AgentRuntime`] that wires both to a shared
//! provider and tool registry.

pub mod agents;
pub mod executor;
pub mod runtime;

// Re-export key types
pub use agents::{SimpleAgent, SimpleConfig};
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, DEFAULT_MODEL, Execution, ExecutorConfig,
    ExecutorEventHandler, NoOpEventHandler, Outcome, ToolCallRecord,
};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};
