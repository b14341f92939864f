//! Anomaly check tool

use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ToolEnv, parse_params, to_json};
use crate::anomaly::{AnomalyDetector, AnomalyReport, Scope};

#[derive(Debug, Deserialize)]
struct AnomalyParams {
    ticker: Option<String>,
}

/// Tool: flagged anomalies and competitive gaps
///
/// Competitive gaps are only computed for the primary ticker.
pub struct CheckAnomaliesTool {
    env: ToolEnv,
}

impl CheckAnomaliesTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }

    fn report(&self, ticker: &str) -> AnomalyReport {
        let config = &self.env.config;
        let detector = AnomalyDetector::new(&self.env.store, &config.thresholds);

        if ticker.eq_ignore_ascii_case(&config.primary_ticker) {
            detector.analyze(config)
        } else {
            AnomalyReport {
                flags: detector.detect(&Scope::Ticker(ticker.to_string())),
                gaps: Vec::new(),
            }
        }
    }
}

#[async_trait]
impl Tool for CheckAnomaliesTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: AnomalyParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };

        let ticker = self.env.ticker_or_primary(params.ticker.as_deref());
        let report = self.report(&ticker);

        let mut value = to_json(&report);
        if let Value::Object(map) = &mut value {
            map.insert("ticker".to_string(), Value::String(ticker));
            map.insert("count".to_string(), Value::from(report.flags.len()));
            map.insert("summary".to_string(), Value::String(report.to_prompt_text()));
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "check_anomalies"
    }

    fn description(&self) -> &str {
        "Detect anomalies and concerning trends in reported metrics (moving-average \
         deviations, FCF declines, NRR weakness) and competitive growth gaps. Returns \
         flagged issues with severity levels."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Company ticker (defaults to the company preparing for its call)"),
            }),
            &[],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support;

    #[tokio::test]
    async fn test_primary_report_includes_gaps() {
        let tool = CheckAnomaliesTool::new(test_support::env());
        let out = tool.execute(json!({})).await.unwrap();

        assert_eq!(out["ticker"], "SNOW");
        assert_eq!(out["count"], 4);
        assert_eq!(out["flags"][1]["rule"], "fcf_decline");
        assert_eq!(out["flags"][1]["severity"], "HIGH");
        assert_eq!(out["gaps"][0]["competitor"], "GOOGL");
        assert!(out["summary"].as_str().unwrap().contains("COMPETITIVE GAPS"));
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_empty_not_error() {
        let tool = CheckAnomaliesTool::new(test_support::env());
        let out = tool.execute(json!({"ticker": "ZZZZ"})).await.unwrap();
        assert_eq!(out["count"], 0);
        assert_eq!(out["gaps"].as_array().unwrap().len(), 0);

        let out = tool.execute(json!({"ticker": ["SNOW"]})).await.unwrap();
        assert_eq!(out["count"], 0);
        assert!(out["message"].is_string());
    }
}
