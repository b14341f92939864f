//! Per-request execution context
//!
//! A [`Context`] travels with a single agent call. Callers seed it with the
//! company being prepared for; agents write back what they did (tools called,
//! tokens spent) so the presentation layer can show the research trail.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Ticker the request is about (e.g. "SNOW")
    pub const TICKER: &str = "ticker";
    /// Display name of the company (e.g. "Snowflake")
    pub const COMPANY: &str = "company";
    /// Fiscal quarter label of the latest period (e.g. "Q3 FY2026")
    pub const QUARTER: &str = "quarter";
    /// Names of the tools the agent called, in order
    pub const TOOL_CALLS: &str = "tool_calls";
    /// Total tokens consumed by the request
    pub const TOKENS_USED: &str = "tokens_used";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use agent_core::Context;
///
/// let mut ctx = Context::new().with_ticker("SNOW").with_company("Snowflake");
/// ctx.record_tool_call("check_anomalies");
///
/// assert_eq!(ctx.ticker(), Some("SNOW"));
/// assert_eq!(ctx.tool_calls(), vec!["check_anomalies".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticker
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.insert(keys::TICKER, Value::String(ticker.into()));
        self
    }

    /// Set the company display name
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.insert(keys::COMPANY, Value::String(company.into()));
        self
    }

    /// Set the fiscal quarter label
    pub fn with_quarter(mut self, quarter: impl Into<String>) -> Self {
        self.insert(keys::QUARTER, Value::String(quarter.into()));
        self
    }

    pub fn ticker(&self) -> Option<&str> {
        self.get_str(keys::TICKER)
    }

    pub fn company(&self) -> Option<&str> {
        self.get_str(keys::COMPANY)
    }

    pub fn quarter(&self) -> Option<&str> {
        self.get_str(keys::QUARTER)
    }

    /// Append a tool name to the research trail
    pub fn record_tool_call(&mut self, tool: &str) {
        let entry = self
            .data
            .entry(keys::TOOL_CALLS.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(calls) = entry {
            calls.push(Value::String(tool.to_string()));
        }
    }

    /// Tools called so far, in call order
    pub fn tool_calls(&self) -> Vec<String> {
        self.get_typed(keys::TOOL_CALLS).ok().flatten().unwrap_or_default()
    }

    /// Add to the running token count
    pub fn add_tokens(&mut self, tokens: usize) {
        let total = self.tokens_used() + tokens;
        self.insert(keys::TOKENS_USED, Value::from(total));
    }

    pub fn tokens_used(&self) -> usize {
        self.get(keys::TOKENS_USED)
            .and_then(Value::as_u64)
            .map_or(0, |n| n as usize)
    }

    /// Insert a raw value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a raw value from the context
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Insert a typed value, serializing it to JSON
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value, deserializing it from JSON
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        self.data
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize context value '{key}': {e}"
                    ))
                })
            })
            .transpose()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
