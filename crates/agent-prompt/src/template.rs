//! Core prompt template trait

use crate::Result;

/// Core trait for prompt templates
///
/// Variables are passed as `serde_json::Value` so the trait stays
/// dyn-compatible and templates can live in a shared registry.
pub trait PromptTemplate: Send + Sync {
    /// Get the template name/identifier
    fn name(&self) -> &str;

    /// Render the template with variables
    fn render(&self, vars: &serde_json::Value) -> Result<String>;

    /// Raw template source (for debugging/inspection)
    fn source(&self) -> &str;
}
