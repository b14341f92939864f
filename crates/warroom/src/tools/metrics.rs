//! Metric history, trend and competitor comparison tools

use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{DateRange, MetricSelector, QueryResult, ToolEnv, parse_params, to_json};
use crate::anomaly::{round1, yoy_growth};
use crate::store::{DataStore, MetricRecord};

const DEFAULT_QUARTERS: usize = 4;

fn no_ticker(store: &DataStore, ticker: &str) -> String {
    format!(
        "No metrics for ticker '{ticker}'. Tickers with metrics: {}",
        store.metric_tickers().join(", ")
    )
}

fn no_metric(store: &DataStore, ticker: &str, raw: &str) -> String {
    format!(
        "No metric matching '{raw}' for {ticker}. Available: {}",
        store.metric_names(ticker).join(", ")
    )
}

/// Metric records of a ticker's most recent `quarters` periods in `range`
///
/// Results are ordered chronologically, then by metric name.
pub fn metric_history(
    store: &DataStore,
    ticker: &str,
    selector: &MetricSelector,
    quarters: usize,
    range: DateRange,
) -> QueryResult<MetricRecord> {
    if store.latest_period(ticker).is_none() {
        return QueryResult::miss(no_ticker(store, ticker));
    }

    let periods: Vec<_> = store
        .periods(ticker)
        .into_iter()
        .filter(|p| range.contains(p.end_date))
        .take(quarters)
        .collect();

    let mut records: Vec<MetricRecord> = store
        .metrics_for(ticker)
        .filter(|r| periods.contains(&r.period) && selector.matches(&r.metric))
        .cloned()
        .collect();
    records.sort_by(|a, b| (a.period, &a.metric).cmp(&(b.period, &b.metric)));

    let result = QueryResult::new(records);
    if result.is_empty() && periods.is_empty() {
        return result.or_message(|| format!("No periods for {ticker} in the requested date range"));
    }
    result.or_message(|| no_metric(store, ticker, &selector.to_string()))
}

/// Aggregate of one metric over a window of periods
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrend {
    pub ticker: String,
    pub metric: String,
    pub periods: usize,
    pub first_period: String,
    pub latest_period: String,
    pub latest: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Latest minus first value of the window
    pub change: f64,
    /// `None` when the first value is zero
    pub change_pct: Option<f64>,
    /// (quarter label, value), oldest first
    pub values: Vec<(String, f64)>,
}

/// Trend of every metric matched by `selector` over the last `quarters` periods
pub fn metric_trend(
    store: &DataStore,
    ticker: &str,
    selector: &MetricSelector,
    quarters: usize,
) -> QueryResult<MetricTrend> {
    if store.latest_period(ticker).is_none() {
        return QueryResult::miss(no_ticker(store, ticker));
    }

    let trends = store
        .metric_names(ticker)
        .into_iter()
        .filter(|name| selector.matches(name))
        .filter_map(|name| {
            let series = store.metric_series(ticker, &name);
            let window = &series[series.len().saturating_sub(quarters.max(1))..];
            trend(&name, window)
        })
        .collect();

    QueryResult::new(trends).or_message(|| no_metric(store, ticker, &selector.to_string()))
}

fn trend(metric: &str, window: &[&MetricRecord]) -> Option<MetricTrend> {
    let (first, latest) = (window.first()?, window.last()?);
    let values: Vec<f64> = window.iter().map(|r| r.value).collect();
    let average = values.iter().sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let change = latest.value - first.value;

    Some(MetricTrend {
        ticker: latest.ticker.clone(),
        metric: metric.to_string(),
        periods: window.len(),
        first_period: first.period.label(),
        latest_period: latest.period.label(),
        latest: latest.value,
        average: round1(average),
        min,
        max,
        change: round1(change),
        change_pct: (first.value != 0.0).then(|| round1(change / first.value.abs() * 100.0)),
        values: window
            .iter()
            .map(|r| (r.period.label(), r.value))
            .collect(),
    })
}

/// One metric value at a company's latest period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub metric: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub ticker: String,
    pub period: Option<String>,
    pub metrics: Vec<MetricPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricGrowth {
    pub ticker: String,
    pub metric: String,
    /// Latest over four periods earlier, in percent
    pub yoy_growth_pct: f64,
}

/// Side-by-side view of the primary company and one competitor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub primary: Snapshot,
    pub competitor: Snapshot,
    pub growth: Vec<MetricGrowth>,
}

fn snapshot(store: &DataStore, ticker: &str, selector: &MetricSelector) -> Snapshot {
    let period = store.latest_period(ticker);
    let mut metrics: Vec<MetricPoint> = period
        .map(|p| {
            store
                .metrics_for(ticker)
                .filter(|r| r.period == p && selector.matches(&r.metric))
                .map(|r| MetricPoint {
                    metric: r.metric.clone(),
                    value: r.value,
                    unit: r.unit.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    metrics.sort_by(|a, b| a.metric.cmp(&b.metric));

    Snapshot {
        ticker: ticker.to_string(),
        period: period.map(|p| p.label()),
        metrics,
    }
}

fn growth(store: &DataStore, ticker: &str, selector: &MetricSelector) -> Vec<MetricGrowth> {
    store
        .metric_names(ticker)
        .into_iter()
        .filter(|name| selector.matches(name))
        .filter_map(|name| {
            let pct = yoy_growth(&store.metric_series(ticker, &name))?;
            Some(MetricGrowth {
                ticker: ticker.to_string(),
                metric: name,
                yoy_growth_pct: round1(pct),
            })
        })
        .collect()
}

/// Compare `primary` against `competitor` on the selected metrics
pub fn compare_to_competitor(
    store: &DataStore,
    primary: &str,
    competitor: &str,
    selector: &MetricSelector,
) -> QueryResult<Comparison> {
    if store.latest_period(competitor).is_none() {
        return QueryResult::miss(format!(
            "No data found for competitor '{competitor}'. Available companies: {}",
            store.metric_tickers().join(", ")
        ));
    }

    let mut growth_rows = growth(store, primary, selector);
    growth_rows.extend(growth(store, competitor, selector));

    QueryResult::new(vec![Comparison {
        primary: snapshot(store, primary, selector),
        competitor: snapshot(store, competitor, selector),
        growth: growth_rows,
    }])
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    ticker: Option<String>,
    #[serde(default = "default_metric")]
    metric: String,
    #[serde(default = "default_quarters")]
    quarters: usize,
    since: Option<String>,
    until: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrendParams {
    ticker: Option<String>,
    metric: Option<String>,
    #[serde(default = "default_quarters")]
    quarters: usize,
}

#[derive(Debug, Deserialize)]
struct CompareParams {
    competitor: Option<String>,
    #[serde(default = "default_metric")]
    metric: String,
}

fn default_metric() -> String {
    "all".to_string()
}

fn default_quarters() -> usize {
    DEFAULT_QUARTERS
}

/// Tool: metric records over recent quarters
pub struct MetricHistoryTool {
    env: ToolEnv,
}

impl MetricHistoryTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for MetricHistoryTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: HistoryParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };
        let range = match DateRange::parse(params.since.as_deref(), params.until.as_deref()) {
            Ok(range) => range,
            Err(message) => return Ok(to_json(&QueryResult::<MetricRecord>::miss(message))),
        };

        let ticker = self.env.ticker_or_primary(params.ticker.as_deref());
        let result = metric_history(
            &self.env.store,
            &ticker,
            &MetricSelector::parse(&params.metric),
            self.env.cap(params.quarters),
            range,
        );
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "get_metric_history"
    }

    fn description(&self) -> &str {
        "Get reported financial metrics (revenue, NRR, RPO, FCF, margins, customer counts) \
         for a company over recent quarters. Use this to find trends, anomalies, or specific \
         data points."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Company ticker (defaults to the company preparing for its call)"),
                "metric": schema::string_with_default(
                    "'all', a group ('revenue', 'nrr', 'rpo', 'fcf', 'margins', 'customers') or an exact metric name",
                    "all"
                ),
                "quarters": schema::integer_with_default("Number of recent quarters to return", DEFAULT_QUARTERS),
                "since": schema::date("Only periods ending on or after this date"),
                "until": schema::date("Only periods ending on or before this date"),
            }),
            &[],
        )
    }
}

/// Tool: aggregate trend of a metric
pub struct MetricTrendTool {
    env: ToolEnv,
}

impl MetricTrendTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for MetricTrendTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: TrendParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };
        let Some(metric) = params.metric.filter(|m| !m.trim().is_empty()) else {
            return Ok(to_json(&QueryResult::<MetricTrend>::miss(
                "Parameter 'metric' is required",
            )));
        };

        let ticker = self.env.ticker_or_primary(params.ticker.as_deref());
        let result = metric_trend(
            &self.env.store,
            &ticker,
            &MetricSelector::parse(&metric),
            self.env.cap(params.quarters),
        );
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "get_metric_trend"
    }

    fn description(&self) -> &str {
        "Summarize how a metric moved over recent quarters: latest, average, min, max and \
         absolute and percent change across the window."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Company ticker (defaults to the company preparing for its call)"),
                "metric": schema::string("Metric group ('revenue', 'nrr', 'fcf', ...) or exact metric name"),
                "quarters": schema::integer_with_default("Window size in quarters", DEFAULT_QUARTERS),
            }),
            &["metric"],
        )
    }
}

/// Tool: compare against one competitor
pub struct CompareToCompetitorTool {
    env: ToolEnv,
}

impl CompareToCompetitorTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for CompareToCompetitorTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: CompareParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };
        let Some(competitor) = params
            .competitor
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
        else {
            return Ok(to_json(&QueryResult::<Comparison>::miss(
                "Parameter 'competitor' is required",
            )));
        };

        let result = compare_to_competitor(
            &self.env.store,
            &self.env.config.primary_ticker,
            &competitor,
            &MetricSelector::parse(&params.metric),
        );
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "compare_to_competitor"
    }

    fn description(&self) -> &str {
        "Compare the company's latest metrics and year-over-year growth directly to a \
         specific competitor's."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "competitor": schema::string("Competitor ticker to compare against (e.g. 'GOOGL', 'DDOG')"),
                "metric": schema::string_with_default("'all', 'revenue_growth', a group or an exact metric name", "all"),
            }),
            &["competitor"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures;
    use crate::tools::test_support;

    #[test]
    fn test_history_takes_recent_quarters() {
        let store = fixtures::store();
        let result = metric_history(
            &store,
            "SNOW",
            &MetricSelector::parse("fcf"),
            2,
            DateRange::default(),
        );
        let values: Vec<f64> = result.results.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![100.0, 40.0]);
        assert_eq!(result.count, 2);
        assert!(result.message.is_none());
    }

    #[test]
    fn test_history_date_range_and_misses() {
        let store = fixtures::store();
        let range = DateRange::parse(Some("2025-01-01"), Some("2025-05-01")).unwrap();
        let result = metric_history(&store, "SNOW", &MetricSelector::parse("nrr"), 4, range);
        let labels: Vec<String> = result.results.iter().map(|r| r.period.label()).collect();
        assert_eq!(labels, vec!["Q4 FY2025", "Q1 FY2026"]);

        let unknown = metric_history(&store, "ZZZZ", &MetricSelector::All, 4, DateRange::default());
        assert!(unknown.is_empty());
        assert!(unknown.message.unwrap().contains("ZZZZ"));

        let bad_metric = metric_history(
            &store,
            "SNOW",
            &MetricSelector::parse("EBITDA"),
            4,
            DateRange::default(),
        );
        assert!(bad_metric.is_empty());
        assert!(bad_metric.message.unwrap().contains("NRR_PERCENT"));
    }

    #[test]
    fn test_trend_aggregates() {
        let store = fixtures::store();
        let result = metric_trend(&store, "SNOW", &MetricSelector::parse("FCF_IN_MILLIONS"), 4);
        assert_eq!(result.count, 1);

        let trend = &result.results[0];
        assert_eq!(trend.periods, 4);
        assert_eq!(trend.first_period, "Q3 FY2025");
        assert_eq!(trend.latest, 40.0);
        assert_eq!(trend.min, 40.0);
        assert_eq!(trend.max, 100.0);
        assert_eq!(trend.average, 77.3);
        assert_eq!(trend.change, -39.0);
        assert_eq!(trend.change_pct, Some(-49.4));
    }

    #[test]
    fn test_compare_to_competitor() {
        let store = fixtures::store();
        let result = compare_to_competitor(&store, "SNOW", "GOOGL", &MetricSelector::parse("revenue_growth"));
        let comparison = &result.results[0];

        assert_eq!(comparison.primary.period.as_deref(), Some("Q2 FY2026"));
        let names: Vec<&str> = comparison.primary.metrics.iter().map(|m| m.metric.as_str()).collect();
        assert_eq!(names, vec!["PRODUCT_REVENUE_M", "TOTAL_REVENUE_M"]);
        assert_eq!(comparison.competitor.metrics[0].value, 13624.0);

        let growth: Vec<(&str, f64)> = comparison
            .growth
            .iter()
            .map(|g| (g.ticker.as_str(), g.yoy_growth_pct))
            .collect();
        assert_eq!(growth, vec![("SNOW", 31.5), ("GOOGL", 31.7)]);

        let missing = compare_to_competitor(&store, "SNOW", "ORCL", &MetricSelector::All);
        assert!(missing.is_empty());
        assert!(missing.message.unwrap().contains("GOOGL"));
    }

    #[tokio::test]
    async fn test_tools_soft_fail() {
        let env = test_support::env();

        let history = MetricHistoryTool::new(env.clone());
        let out = history
            .execute(json!({"ticker": "ZZZZ", "metric": "all"}))
            .await
            .unwrap();
        assert_eq!(out["count"], 0);

        let out = history
            .execute(json!({"since": "yesterday"}))
            .await
            .unwrap();
        assert_eq!(out["count"], 0);
        assert!(out["message"].as_str().unwrap().contains("yesterday"));

        let out = history.execute(json!({"quarters": "four"})).await.unwrap();
        assert_eq!(out["count"], 0);

        let trend = MetricTrendTool::new(env.clone());
        let out = trend.execute(json!({})).await.unwrap();
        assert_eq!(out["message"], "Parameter 'metric' is required");

        let compare = CompareToCompetitorTool::new(env);
        let out = compare.execute(json!({"competitor": "ddog"})).await.unwrap();
        assert_eq!(out["count"], 1);
        assert_eq!(out["results"][0]["competitor"]["ticker"], "DDOG");
    }

    #[tokio::test]
    async fn test_history_tool_defaults_to_primary() {
        let tool = MetricHistoryTool::new(test_support::env());
        let out = tool.execute(json!({"metric": "nrr"})).await.unwrap();
        assert_eq!(out["count"], 4);
        assert_eq!(out["results"][3]["value"], 108.0);
        assert_eq!(out["results"][3]["ticker"], "SNOW");
    }
}
