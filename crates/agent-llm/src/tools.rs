//! Tool definition types for LLM tool use

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition sent to the provider
///
/// Name, description and a JSON Schema for the tool's input, exactly as the
/// Messages API expects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the tool in the registry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helpers to build JSON schemas for tool inputs
pub mod schema {
    use serde_json::{Value, json};

    /// Object schema with properties and required keys
    ///
    /// # Example
    ///
    /// ```
    /// use agent_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "keyword": schema::string("Keyword to search for"),
    ///         "limit": schema::integer_with_default("Max results", 3),
    ///     }),
    ///     &["keyword"],
    /// );
    /// assert_eq!(schema["required"][0], "keyword");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// String property with a default value
    pub fn string_with_default(description: &str, default: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
            "default": default,
        })
    }

    /// String property restricted to a set of values
    pub fn string_enum(description: &str, values: &[&str]) -> Value {
        json!({
            "type": "string",
            "description": description,
            "enum": values,
        })
    }

    /// Integer property with a default value
    pub fn integer_with_default(description: &str, default: usize) -> Value {
        json!({
            "type": "integer",
            "description": description,
            "default": default,
        })
    }

    /// ISO date (YYYY-MM-DD) property
    pub fn date(description: &str) -> Value {
        json!({
            "type": "string",
            "format": "date",
            "description": description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_creation() {
        let schema = schema::object(
            json!({
                "competitor": schema::string("Competitor ticker"),
            }),
            &["competitor"],
        );

        let tool = ToolDefinition::new("compare_to_competitor", "Compare metrics", schema.clone());
        assert_eq!(tool.name, "compare_to_competitor");
        assert_eq!(tool.input_schema, schema);
    }

    #[test]
    fn test_schema_builders() {
        let e = schema::string_enum("metric", &["all", "fcf"]);
        assert_eq!(e["enum"][1], "fcf");

        let d = schema::integer_with_default("quarters", 4);
        assert_eq!(d["type"], "integer");
        assert_eq!(d["default"], 4);

        assert_eq!(schema::date("since")["format"], "date");
        assert_eq!(schema::string_with_default("company", "all")["default"], "all");
    }
}
