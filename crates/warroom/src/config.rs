//! Configuration for the war room

use agent_runtime::DEFAULT_MODEL;
use agent_utils::EnvConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::anomaly::AnomalyThresholds;
use crate::error::{Result, WarRoomError};
use crate::store::DataSources;

/// Configuration for a war room session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarRoomConfig {
    /// Display name of the company preparing for its call
    pub company_name: String,

    /// Ticker of that company; tool queries default to it
    pub primary_ticker: String,

    /// CSV source locations
    pub data: DataSources,

    /// Model used for every generation request
    pub model: String,

    /// Token budget of research-loop turns
    pub max_tokens: usize,

    /// Token budget of the final question set
    pub question_max_tokens: usize,

    /// Token budget of defense talking points and topic questions
    pub answer_max_tokens: usize,

    pub temperature: Option<f32>,

    pub thresholds: AnomalyThresholds,

    /// Competitors compared against, as (ticker, revenue metric)
    pub benchmarks: Vec<(String, String)>,

    /// Revenue metric of the primary company used for competitive gaps
    pub revenue_metric: String,

    /// Model turns allowed to the Question Agent
    pub question_turns: usize,

    /// Model turns allowed to the Defense Agent
    pub defense_turns: usize,

    /// Upper bound on records returned by any single tool call
    pub max_tool_results: usize,

    /// HTTP request timeout for the generation service
    pub request_timeout: Duration,

    /// Generation service base URL override
    pub api_base: Option<String>,
}

impl Default for WarRoomConfig {
    fn default() -> Self {
        Self {
            company_name: "Snowflake".to_string(),
            primary_ticker: "SNOW".to_string(),
            data: DataSources::default(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4000,
            question_max_tokens: 2000,
            answer_max_tokens: 1000,
            temperature: None,
            thresholds: AnomalyThresholds::default(),
            benchmarks: vec![
                ("GOOGL".to_string(), "CLOUD_REVENUE".to_string()),
                ("AMZN".to_string(), "AWS_REVENUE".to_string()),
            ],
            revenue_metric: "PRODUCT_REVENUE_M".to_string(),
            question_turns: 5,
            defense_turns: 4,
            max_tool_results: 20,
            request_timeout: Duration::from_secs(120),
            api_base: None,
        }
    }
}

impl WarRoomConfig {
    /// Create a new configuration builder
    pub fn builder() -> WarRoomConfigBuilder {
        WarRoomConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.primary_ticker.trim().is_empty() {
            return Err(WarRoomError::Config(
                "primary_ticker must not be empty".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(WarRoomError::Config("model must not be empty".to_string()));
        }

        for (name, value) in [
            ("max_tokens", self.max_tokens),
            ("question_max_tokens", self.question_max_tokens),
            ("answer_max_tokens", self.answer_max_tokens),
            ("question_turns", self.question_turns),
            ("defense_turns", self.defense_turns),
            ("max_tool_results", self.max_tool_results),
        ] {
            if value == 0 {
                return Err(WarRoomError::Config(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(WarRoomError::Config(format!(
                    "temperature {t} outside 0.0-1.0"
                )));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(WarRoomError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        self.thresholds.validate()
    }
}

/// Builder for WarRoomConfig
#[derive(Debug, Default)]
pub struct WarRoomConfigBuilder {
    company_name: Option<String>,
    primary_ticker: Option<String>,
    data_dir: Option<PathBuf>,
    model: Option<String>,
    max_tokens: Option<usize>,
    question_max_tokens: Option<usize>,
    answer_max_tokens: Option<usize>,
    temperature: Option<f32>,
    thresholds: Option<AnomalyThresholds>,
    benchmarks: Option<Vec<(String, String)>>,
    revenue_metric: Option<String>,
    question_turns: Option<usize>,
    defense_turns: Option<usize>,
    max_tool_results: Option<usize>,
    request_timeout: Option<Duration>,
    api_base: Option<String>,
}

impl WarRoomConfigBuilder {
    pub fn company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    /// Set the primary ticker (stored upper case)
    pub fn primary_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.primary_ticker = Some(ticker.into().trim().to_ascii_uppercase());
        self
    }

    /// Set the directory holding the CSV sources
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn question_max_tokens(mut self, tokens: usize) -> Self {
        self.question_max_tokens = Some(tokens);
        self
    }

    pub fn answer_max_tokens(mut self, tokens: usize) -> Self {
        self.answer_max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn thresholds(mut self, thresholds: AnomalyThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn benchmarks(mut self, benchmarks: Vec<(String, String)>) -> Self {
        self.benchmarks = Some(benchmarks);
        self
    }

    pub fn revenue_metric(mut self, metric: impl Into<String>) -> Self {
        self.revenue_metric = Some(metric.into());
        self
    }

    pub fn question_turns(mut self, turns: usize) -> Self {
        self.question_turns = Some(turns);
        self
    }

    pub fn defense_turns(mut self, turns: usize) -> Self {
        self.defense_turns = Some(turns);
        self
    }

    pub fn max_tool_results(mut self, max: usize) -> Self {
        self.max_tool_results = Some(max);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Apply environment settings not already set on the builder
    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        if self.data_dir.is_none() {
            self.data_dir = Some(env.data_dir.clone());
        }
        if self.model.is_none() {
            self.model.clone_from(&env.model);
        }
        if self.api_base.is_none() {
            self.api_base.clone_from(&env.api_base);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<WarRoomConfig> {
        let defaults = WarRoomConfig::default();

        let config = WarRoomConfig {
            company_name: self.company_name.unwrap_or(defaults.company_name),
            primary_ticker: self.primary_ticker.unwrap_or(defaults.primary_ticker),
            data: self.data_dir.map_or(defaults.data, DataSources::new),
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            question_max_tokens: self
                .question_max_tokens
                .unwrap_or(defaults.question_max_tokens),
            answer_max_tokens: self.answer_max_tokens.unwrap_or(defaults.answer_max_tokens),
            temperature: self.temperature.or(defaults.temperature),
            thresholds: self.thresholds.unwrap_or(defaults.thresholds),
            benchmarks: self.benchmarks.unwrap_or(defaults.benchmarks),
            revenue_metric: self.revenue_metric.unwrap_or(defaults.revenue_metric),
            question_turns: self.question_turns.unwrap_or(defaults.question_turns),
            defense_turns: self.defense_turns.unwrap_or(defaults.defense_turns),
            max_tool_results: self.max_tool_results.unwrap_or(defaults.max_tool_results),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            api_base: self.api_base.or(defaults.api_base),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WarRoomConfig::default();
        assert_eq!(config.primary_ticker, "SNOW");
        assert_eq!(config.company_name, "Snowflake");
        assert_eq!(config.question_turns, 5);
        assert_eq!(config.defense_turns, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = WarRoomConfig::builder()
            .company_name("Datadog")
            .primary_ticker(" ddog ")
            .data_dir("/tmp/ir")
            .defense_turns(2)
            .temperature(0.3)
            .build()
            .unwrap();

        assert_eq!(config.primary_ticker, "DDOG");
        assert_eq!(config.company_name, "Datadog");
        assert_eq!(config.data.path(&config.data.metrics), PathBuf::from("/tmp/ir/metrics.csv"));
        assert_eq!(config.defense_turns, 2);
        assert_eq!(config.temperature, Some(0.3));
        assert_eq!(config.question_turns, 5);
    }

    #[test]
    fn test_validation_failures() {
        assert!(WarRoomConfig::builder().primary_ticker("").build().is_err());
        assert!(WarRoomConfig::builder().question_turns(0).build().is_err());
        assert!(WarRoomConfig::builder().max_tool_results(0).build().is_err());
        assert!(WarRoomConfig::builder().temperature(1.5).build().is_err());
        assert!(
            WarRoomConfig::builder()
                .request_timeout(Duration::ZERO)
                .build()
                .is_err()
        );

        let thresholds = AnomalyThresholds {
            nrr_decline_quarters: 0,
            ..AnomalyThresholds::default()
        };
        let err = WarRoomConfig::builder().thresholds(thresholds).build().unwrap_err();
        assert!(matches!(err, WarRoomError::Config(_)));
    }

    #[test]
    fn test_env_fills_unset_fields_only() {
        let env = EnvConfig::from_lookup(|key| match key {
            "WARROOM_DATA_DIR" => Some("/srv/warroom".to_string()),
            "WARROOM_MODEL" => Some("claude-from-env".to_string()),
            "ANTHROPIC_API_BASE" => Some("http://localhost:8080/v1".to_string()),
            _ => None,
        });

        let config = WarRoomConfig::builder()
            .model("claude-from-flag")
            .with_env(&env)
            .build()
            .unwrap();

        assert_eq!(config.model, "claude-from-flag");
        assert_eq!(config.data.dir, PathBuf::from("/srv/warroom"));
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:8080/v1"));
    }
}
