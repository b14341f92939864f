//! Analyst research and competitor news tools

use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

use super::{DateRange, QueryResult, ToolEnv, excerpt, parse_params, to_json};
use crate::anomaly::round1;
use crate::store::{AnalystNote, DataStore, NewsItem};

const SUMMARY_CHARS: usize = 200;

/// Aggregate view of a set of analyst notes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consensus {
    pub count: usize,
    pub average_target: Option<f64>,
    pub high_target: Option<f64>,
    pub low_target: Option<f64>,
    /// Notes per rating label ("Buy", "Hold", ...)
    pub ratings: BTreeMap<String, usize>,
}

impl Consensus {
    fn from_notes(notes: &[AnalystNote]) -> Self {
        let targets: Vec<f64> = notes.iter().filter_map(|n| n.price_target).collect();
        let mut ratings = BTreeMap::new();
        for note in notes {
            *ratings.entry(note.rating.clone()).or_insert(0) += 1;
        }

        Self {
            count: notes.len(),
            average_target: (!targets.is_empty())
                .then(|| round1(targets.iter().sum::<f64>() / targets.len() as f64)),
            high_target: targets.iter().copied().reduce(f64::max),
            low_target: targets.iter().copied().reduce(f64::min),
            ratings,
        }
    }
}

/// Analyst notes plus their consensus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalystRatings {
    #[serde(flatten)]
    pub notes: QueryResult<AnalystNote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus: Option<Consensus>,
}

/// Notes for `company` (or every company for "all"), newest first
pub fn analyst_ratings(store: &DataStore, company: &str, range: DateRange) -> AnalystRatings {
    let all = company.trim().eq_ignore_ascii_case("all");
    let mut notes: Vec<AnalystNote> = store
        .ratings()
        .iter()
        .filter(|n| all || n.ticker.eq_ignore_ascii_case(company.trim()))
        .filter(|n| range.contains(n.rating_date))
        .cloned()
        .collect();
    notes.sort_by(|a, b| b.rating_date.cmp(&a.rating_date));

    let consensus = (!notes.is_empty()).then(|| Consensus::from_notes(&notes));
    AnalystRatings {
        notes: QueryResult::new(notes)
            .or_message(|| format!("No analyst ratings found for {company}")),
        consensus,
    }
}

/// A news item with its summary truncated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsHit {
    pub ticker: String,
    pub news_date: NaiveDate,
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&NewsItem> for NewsHit {
    fn from(item: &NewsItem) -> Self {
        Self {
            ticker: item.ticker.clone(),
            news_date: item.news_date,
            headline: item.headline.clone(),
            summary: item.summary.as_deref().map(|s| excerpt(s, SUMMARY_CHARS)),
            source: item.source.clone(),
        }
    }
}

/// News about `ticker`, newest first
///
/// "all" selects every ticker except `primary`.
pub fn competitor_news(
    store: &DataStore,
    ticker: &str,
    primary: &str,
    limit: usize,
) -> QueryResult<NewsHit> {
    let ticker = ticker.trim();
    let all = ticker.is_empty() || ticker.eq_ignore_ascii_case("all");

    let mut items: Vec<&NewsItem> = store
        .news()
        .iter()
        .filter(|n| {
            if all {
                !n.ticker.eq_ignore_ascii_case(primary)
            } else {
                n.ticker.eq_ignore_ascii_case(ticker)
            }
        })
        .collect();
    items.sort_by(|a, b| b.news_date.cmp(&a.news_date));

    QueryResult::new(items.into_iter().take(limit).map(NewsHit::from).collect())
        .or_message(|| format!("No news found for {}", if all { "all" } else { ticker }))
}

#[derive(Debug, Deserialize)]
struct RatingsParams {
    company: Option<String>,
    since: Option<String>,
    until: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    #[serde(default = "default_news_ticker")]
    ticker: String,
    #[serde(default = "default_news_limit")]
    limit: usize,
}

fn default_news_ticker() -> String {
    "all".to_string()
}

fn default_news_limit() -> usize {
    10
}

/// Tool: analyst ratings, price targets and notes
pub struct AnalystRatingsTool {
    env: ToolEnv,
}

impl AnalystRatingsTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for AnalystRatingsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: RatingsParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };
        let range = match DateRange::parse(params.since.as_deref(), params.until.as_deref()) {
            Ok(range) => range,
            Err(message) => return Ok(to_json(&QueryResult::<AnalystNote>::miss(message))),
        };

        let company = self.env.ticker_or_primary(params.company.as_deref());
        let mut result = analyst_ratings(&self.env.store, &company, range);
        // Consensus covers every matching note; the list itself is capped
        result.notes.results.truncate(self.env.config.max_tool_results);
        result.notes.count = result.notes.results.len();
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "get_analyst_ratings"
    }

    fn description(&self) -> &str {
        "Get analyst ratings, price targets and research notes for the company or a \
         competitor, newest first, with a consensus summary."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "company": schema::string("Company ticker, or 'all' (defaults to the company preparing for its call)"),
                "since": schema::date("Only ratings on or after this date"),
                "until": schema::date("Only ratings on or before this date"),
            }),
            &[],
        )
    }
}

/// Tool: recent competitor headlines
pub struct CompetitorNewsTool {
    env: ToolEnv,
}

impl CompetitorNewsTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for CompetitorNewsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: NewsParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };

        let result = competitor_news(
            &self.env.store,
            &params.ticker,
            &self.env.config.primary_ticker,
            self.env.cap(params.limit),
        );
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "get_competitor_news"
    }

    fn description(&self) -> &str {
        "Get recent news and headlines about competitors. Useful for finding competitive \
         threats or market trends."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string_with_default("Competitor ticker (e.g. 'DDOG', 'MDB') or 'all' for every competitor", "all"),
                "limit": schema::integer_with_default("Max headlines to return", default_news_limit()),
            }),
            &[],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures;
    use crate::tools::test_support;

    #[test]
    fn test_ratings_newest_first_with_consensus() {
        let store = fixtures::store();
        let result = analyst_ratings(&store, "snow", DateRange::default());

        let firms: Vec<&str> = result.notes.results.iter().map(|n| n.firm.as_str()).collect();
        assert_eq!(firms, vec!["Beta Capital", "Alpha Securities", "Gamma Research"]);

        let consensus = result.consensus.unwrap();
        assert_eq!(consensus.count, 3);
        assert_eq!(consensus.average_target, Some(230.0));
        assert_eq!(consensus.high_target, Some(260.0));
        assert_eq!(consensus.low_target, Some(200.0));
        assert_eq!(consensus.ratings.get("Sell"), Some(&1));
    }

    #[test]
    fn test_ratings_all_and_unknown() {
        let store = fixtures::store();
        assert_eq!(analyst_ratings(&store, "all", DateRange::default()).notes.count, 4);

        let unknown = analyst_ratings(&store, "ZZZZ", DateRange::default());
        assert!(unknown.notes.is_empty());
        assert!(unknown.consensus.is_none());
        assert_eq!(unknown.notes.message.as_deref(), Some("No analyst ratings found for ZZZZ"));
    }

    #[test]
    fn test_news_all_excludes_primary() {
        let store = fixtures::store();
        let result = competitor_news(&store, "all", "SNOW", 10);
        let tickers: Vec<&str> = result.results.iter().map(|n| n.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["DDOG", "MDB"]);

        let snow = competitor_news(&store, "SNOW", "SNOW", 10);
        assert_eq!(snow.count, 1);

        let none = competitor_news(&store, "ORCL", "SNOW", 10);
        assert!(none.is_empty());
        assert_eq!(none.message.as_deref(), Some("No news found for ORCL"));
    }

    #[tokio::test]
    async fn test_tools_through_json() {
        let env = test_support::env();

        let ratings = AnalystRatingsTool::new(env.clone());
        let out = ratings.execute(json!({})).await.unwrap();
        assert_eq!(out["count"], 3);
        assert_eq!(out["consensus"]["count"], 3);
        assert_eq!(out["results"][0]["rating_date"], "2025-09-02");

        let out = ratings.execute(json!({"since": "soon"})).await.unwrap();
        assert_eq!(out["count"], 0);

        let news = CompetitorNewsTool::new(env);
        let out = news.execute(json!({"limit": 1})).await.unwrap();
        assert_eq!(out["count"], 1);
        assert_eq!(out["results"][0]["ticker"], "DDOG");
    }
}
