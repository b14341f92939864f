//! Tool trait definition

use agent_core::Result;
use agent_llm::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Each tool provides a name, a description the model reads to decide when
/// to call it, and a JSON Schema for its input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// `params` should match [`Tool::input_schema`]; the returned JSON is
    /// serialized and handed back to the model as the tool result.
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Unique tool name, as the model will call it
    fn name(&self) -> &str;

    /// What the tool does and when to use it
    fn description(&self) -> &str;

    /// JSON Schema of the tool input
    fn input_schema(&self) -> Value;

    /// Definition sent to the provider
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}
