//! Prompt template registry
//!
//! This module provides [`PromptRegistry`], a thread-safe registry for managing
//! and accessing prompt templates by name.

use crate::{PromptError, PromptTemplate, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A thread-safe registry of prompt templates
///
/// # Examples
///
/// ```
/// use agent_prompt::{JinjaTemplate, PromptRegistry};
/// use serde_json::json;
///
/// let registry = PromptRegistry::new();
/// registry.register(JinjaTemplate::new("topic", "Questions about {{ topic }}").unwrap());
///
/// let text = registry.render("topic", &json!({ "topic": "RPO" })).unwrap();
/// assert_eq!(text, "Questions about RPO");
/// ```
#[derive(Default)]
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, Arc<dyn PromptTemplate>>>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template
    ///
    /// If a template with the same name already exists, it will be replaced.
    pub fn register<T: PromptTemplate + 'static>(&self, template: T) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(template.name().to_string(), Arc::new(template));
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn PromptTemplate>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Check if a template is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Render a registered template
    ///
    /// # Errors
    ///
    /// Returns an error if the template is not registered or rendering fails
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))?;
        template.render(vars)
    }

    /// Registered template names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("templates", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JinjaTemplate;
    use serde_json::json;

    #[test]
    fn test_register_and_get() {
        let registry = PromptRegistry::new();
        assert!(registry.is_empty());
        registry.register(JinjaTemplate::new("test", "Hello").unwrap());

        assert!(registry.contains("test"));
        assert!(registry.get("test").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_render_not_registered() {
        let registry = PromptRegistry::new();
        let err = registry.render("nonexistent", &json!({})).unwrap_err();
        assert!(matches!(err, PromptError::TemplateNotRegistered(_)));
    }

    #[test]
    fn test_replace_template() {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new("test", "Version 1").unwrap());
        registry.register(JinjaTemplate::new("test", "Version 2").unwrap());

        assert_eq!(registry.render("test", &json!({})).unwrap(), "Version 2");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new("b", "B").unwrap());
        registry.register(JinjaTemplate::new("a", "A").unwrap());

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(format!("{registry:?}").contains("PromptRegistry"));
    }
}
