//! Read-only query tools over the data store
//!
//! Every query is a plain function over [`DataStore`] so it can be tested and
//! called directly; a thin [`agent_tools::Tool`] wrapper exposes it to the
//! model. Bad filter input (unknown ticker, unknown metric, unparseable date,
//! wrong JSON shape) produces an empty result carrying a message. Tools never
//! return an error.

pub mod anomalies;
pub mod filings;
pub mod metrics;
pub mod research;
pub mod transcripts;

pub use anomalies::CheckAnomaliesTool;
pub use filings::{PressReleasesTool, SecFilingsTool};
pub use metrics::{CompareToCompetitorTool, MetricHistoryTool, MetricTrendTool};
pub use research::{AnalystRatingsTool, CompetitorNewsTool};
pub use transcripts::{LatestTranscriptTool, SearchTranscriptsTool};

use agent_llm::ToolDefinition;
use agent_llm::tools::schema;
use agent_tools::ToolRegistry;
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::WarRoomConfig;
use crate::store::{DataStore, parse_date};

/// Name of the Question Agent's terminal tool
pub const GENERATE_QUESTIONS: &str = "generate_questions";

/// Name of the Defense Agent's terminal tool
pub const GENERATE_DEFENSE: &str = "generate_defense";

/// Tools available to the Defense Agent
pub const DEFENSE_TOOLS: [&str; 6] = [
    "get_metric_history",
    "get_metric_trend",
    "search_transcripts",
    "get_press_releases",
    "check_anomalies",
    "compare_to_competitor",
];

/// Shared state handed to every tool
#[derive(Clone)]
pub struct ToolEnv {
    pub store: Arc<DataStore>,
    pub config: Arc<WarRoomConfig>,
}

impl ToolEnv {
    pub fn new(store: Arc<DataStore>, config: Arc<WarRoomConfig>) -> Self {
        Self { store, config }
    }

    /// Requested ticker, or the primary ticker when absent or blank
    pub fn ticker_or_primary(&self, ticker: Option<&str>) -> String {
        match ticker.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_ascii_uppercase(),
            _ => self.config.primary_ticker.clone(),
        }
    }

    /// Clamp a requested limit to 1..=max_tool_results
    pub fn cap(&self, limit: usize) -> usize {
        limit.clamp(1, self.config.max_tool_results)
    }
}

/// Bounded sequence of matches, with an optional explanation when empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<T> {
    pub count: usize,
    pub results: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> QueryResult<T> {
    pub fn new(results: Vec<T>) -> Self {
        Self {
            count: results.len(),
            results,
            message: None,
        }
    }

    /// Empty result explaining why nothing matched
    pub fn miss(message: impl Into<String>) -> Self {
        Self {
            count: 0,
            results: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// Attach a message when there are no results
    pub fn or_message(mut self, message: impl FnOnce() -> String) -> Self {
        if self.results.is_empty() && self.message.is_none() {
            self.message = Some(message());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Serialize a tool result to JSON
pub(crate) fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| soft_fail(format!("Failed to encode result: {e}")))
}

/// Empty result document carrying a message
pub(crate) fn soft_fail(message: impl Into<String>) -> Value {
    json!({ "count": 0, "results": [], "message": message.into() })
}

/// Decode tool parameters, treating `null` as `{}`
///
/// A shape mismatch returns the soft-fail document to hand back to the model.
pub(crate) fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T, Value> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| {
        debug!(tool, error = %e, "Rejected tool parameters");
        soft_fail(format!("Invalid parameters for {tool}: {e}"))
    })
}

/// Inclusive date window from optional `since`/`until` strings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DateRange {
    /// Parse both bounds; blank bounds are open
    pub fn parse(since: Option<&str>, until: Option<&str>) -> Result<Self, String> {
        let bound = |raw: Option<&str>, name: &str| -> Result<Option<NaiveDate>, String> {
            match raw.map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => parse_date(s)
                    .map(Some)
                    .ok_or_else(|| format!("Unparseable {name} date '{s}', expected YYYY-MM-DD")),
            }
        };
        Ok(Self {
            since: bound(since, "since")?,
            until: bound(until, "until")?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since.is_none_or(|s| date >= s) && self.until.is_none_or(|u| date <= u)
    }
}

/// Which metrics a query selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricSelector {
    All,
    /// Group alias matched by substring of the metric name
    Group(&'static str),
    Exact(String),
}

impl MetricSelector {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "" | "all" => Self::All,
            "revenue" | "revenue_growth" => Self::Group("REVENUE"),
            "nrr" => Self::Group("NRR"),
            "rpo" => Self::Group("RPO"),
            "fcf" => Self::Group("FCF"),
            "margins" | "margin" => Self::Group("MARGIN"),
            "customers" => Self::Group("CUSTOMER"),
            _ => Self::Exact(raw.to_ascii_uppercase()),
        }
    }

    pub fn matches(&self, metric: &str) -> bool {
        match self {
            Self::All => true,
            Self::Group(pattern) => metric.to_ascii_uppercase().contains(pattern),
            Self::Exact(name) => metric.eq_ignore_ascii_case(name),
        }
    }
}

impl fmt::Display for MetricSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Group(pattern) => write!(f, "{}", pattern.to_ascii_lowercase()),
            Self::Exact(name) => f.write_str(name),
        }
    }
}

/// Truncate to at most `max` characters
pub(crate) fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Case-insensitive substring match; an empty needle matches everything
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Register every data tool
pub fn register_data_tools(registry: &ToolRegistry, env: &ToolEnv) {
    registry.register(Arc::new(MetricHistoryTool::new(env.clone())));
    registry.register(Arc::new(MetricTrendTool::new(env.clone())));
    registry.register(Arc::new(SearchTranscriptsTool::new(env.clone())));
    registry.register(Arc::new(LatestTranscriptTool::new(env.clone())));
    registry.register(Arc::new(AnalystRatingsTool::new(env.clone())));
    registry.register(Arc::new(CompetitorNewsTool::new(env.clone())));
    registry.register(Arc::new(CheckAnomaliesTool::new(env.clone())));
    registry.register(Arc::new(SecFilingsTool::new(env.clone())));
    registry.register(Arc::new(PressReleasesTool::new(env.clone())));
    registry.register(Arc::new(CompareToCompetitorTool::new(env.clone())));
}

/// Registry holding every data tool
pub fn data_tool_registry(env: &ToolEnv) -> ToolRegistry {
    let registry = ToolRegistry::new();
    register_data_tools(&registry, env);
    registry
}

/// Terminal tool of the Question Agent
pub fn generate_questions_tool() -> ToolDefinition {
    ToolDefinition::new(
        GENERATE_QUESTIONS,
        "Call this ONLY when you have gathered enough information. Generates the final \
         analyst questions based on your research.",
        schema::object(
            json!({
                "findings": schema::string(
                    "Summary of your key findings that should inform the questions"
                ),
            }),
            &["findings"],
        ),
    )
}

/// Terminal tool of the Defense Agent
pub fn generate_defense_tool() -> ToolDefinition {
    ToolDefinition::new(
        GENERATE_DEFENSE,
        "Call this when you have enough evidence to answer the analyst question. \
         Produces the final executive talking points.",
        schema::object(
            json!({
                "talking_points": schema::string(
                    "Draft talking points and the data supporting each"
                ),
            }),
            &["talking_points"],
        ),
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range() {
        let range = DateRange::parse(Some("2025-06-01"), Some("")).unwrap();
        let inside = NaiveDate::from_ymd_opt(2025, 8, 27).unwrap();
        let before = NaiveDate::from_ymd_opt(2025, 5, 21).unwrap();
        assert!(range.contains(inside));
        assert!(!range.contains(before));
        assert!(DateRange::default().contains(before));

        let err = DateRange::parse(Some("last week"), None).unwrap_err();
        assert!(err.contains("last week"));
    }

    #[test]
    fn test_metric_selector() {
        assert_eq!(MetricSelector::parse("ALL"), MetricSelector::All);
        assert!(MetricSelector::parse("revenue").matches("PRODUCT_REVENUE_M"));
        assert!(MetricSelector::parse("revenue_growth").matches("CLOUD_REVENUE"));
        assert!(MetricSelector::parse("margins").matches("GROSS_MARGIN_PERCENT"));
        assert!(!MetricSelector::parse("fcf").matches("NRR_PERCENT"));
        assert!(MetricSelector::parse("rpo_m").matches("RPO_M"));
        assert!(!MetricSelector::parse("rpo_m").matches("RPO"));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("abcdef", 3), "abc...");
        assert_eq!(excerpt("é€ab", 2), "é€...");
    }

    #[test]
    fn test_parse_params_soft_fails() {
        #[derive(serde::Deserialize, Debug)]
        struct P {
            #[serde(default)]
            limit: Option<usize>,
        }

        let p: P = parse_params("t", Value::Null).unwrap();
        assert_eq!(p.limit, None);

        let miss = parse_params::<P>("t", json!({"limit": "many"})).unwrap_err();
        assert_eq!(miss["count"], 0);
        assert!(miss["message"].as_str().unwrap().starts_with("Invalid parameters for t"));
    }

    #[test]
    fn test_registry_and_caps() {
        let env = test_support::env();
        let registry = data_tool_registry(&env);
        assert_eq!(registry.len(), 10);
        for name in DEFENSE_TOOLS {
            assert!(registry.get(name).is_some(), "{name} not registered");
        }
        assert!(registry.get(GENERATE_QUESTIONS).is_none());

        assert_eq!(env.cap(0), 1);
        assert_eq!(env.cap(500), 20);
        assert_eq!(env.ticker_or_primary(Some(" ddog ")), "DDOG");
        assert_eq!(env.ticker_or_primary(None), "SNOW");
    }
}
