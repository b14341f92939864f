//! Tool registry for managing available tools

use crate::Tool;
use agent_llm::ToolDefinition;
use std::sync::{Arc, PoisonError, RwLock};

/// Ordered registry of tools
///
/// Registering a tool under an existing name replaces it in place.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<Vec<Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        match tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => tools[index] = tool,
            None => tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.iter().find(|t| t.name() == name).cloned()
    }

    /// All tools, in registration order
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.clone()
    }

    /// Tool names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.list_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Definitions for every registered tool, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools().iter().map(|t| t.definition()).collect()
    }

    /// A new registry holding only the named tools
    ///
    /// Order follows `names`; names that are not registered are skipped.
    pub fn subset(&self, names: &[&str]) -> ToolRegistry {
        let subset = ToolRegistry::new();
        for name in names {
            if let Some(tool) = self.get(name) {
                subset.register(tool);
            }
        }
        subset
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct EchoTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        async fn execute(&self, _params: Value) -> agent_core::Result<Value> {
            Ok(json!({ "reply": self.reply }))
        }

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echo a fixed reply"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object", "properties": {}, "required": [] })
        }
    }

    fn echo(name: &'static str, reply: &'static str) -> Arc<dyn Tool> {
        Arc::new(EchoTool { name, reply })
    }

    #[test]
    fn test_registration_order_is_kept() {
        let registry = ToolRegistry::new();
        registry.register(echo("b", "1"));
        registry.register(echo("a", "2"));
        registry.register(echo("c", "3"));

        assert_eq!(registry.names(), vec!["b", "a", "c"]);
        assert_eq!(registry.definitions()[1].name, "a");
    }

    #[tokio::test]
    async fn test_reregister_replaces_in_place() {
        let registry = ToolRegistry::new();
        registry.register(echo("a", "old"));
        registry.register(echo("b", "x"));
        registry.register(echo("a", "new"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
        let out = registry.get("a").unwrap().execute(json!({})).await.unwrap();
        assert_eq!(out["reply"], "new");
    }

    #[test]
    fn test_subset_follows_requested_order_and_skips_unknown() {
        let registry = ToolRegistry::new();
        registry.register(echo("a", ""));
        registry.register(echo("b", ""));
        registry.register(echo("c", ""));

        let subset = registry.subset(&["c", "missing", "a"]);
        assert_eq!(subset.names(), vec!["c", "a"]);
        assert!(registry.get("missing").is_none());
        assert!(!subset.is_empty());
    }
}
