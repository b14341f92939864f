//! Earnings call transcript tools

use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{DateRange, QueryResult, ToolEnv, contains_ci, excerpt, parse_params, to_json};
use crate::store::{DataStore, TranscriptEntry};

const EXCERPT_CHARS: usize = 500;

/// One utterance, truncated for the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptHit {
    pub ticker: String,
    pub event_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    pub sequence: u32,
    pub speaker: String,
    pub excerpt: String,
}

impl From<&TranscriptEntry> for TranscriptHit {
    fn from(entry: &TranscriptEntry) -> Self {
        Self {
            ticker: entry.ticker.clone(),
            event_date: entry.event_date,
            event_type: entry.event_type.clone(),
            sequence: entry.sequence,
            speaker: entry.speaker.clone(),
            excerpt: excerpt(&entry.text, EXCERPT_CHARS),
        }
    }
}

/// Which companies a query covers; `None` means every ticker
fn company_filter(company: &str) -> Option<&str> {
    let company = company.trim();
    (!company.is_empty() && !company.eq_ignore_ascii_case("all")).then_some(company)
}

/// Utterances containing `keyword`, most recent call first
///
/// Within a call, utterances keep their speaking order. An empty keyword
/// matches every utterance.
pub fn search_transcripts(
    store: &DataStore,
    keyword: &str,
    company: &str,
    limit: usize,
    range: DateRange,
) -> QueryResult<TranscriptHit> {
    let ticker = company_filter(company);
    let keyword = keyword.trim();

    let mut hits: Vec<&TranscriptEntry> = store
        .transcripts()
        .iter()
        .filter(|t| ticker.is_none_or(|c| t.ticker.eq_ignore_ascii_case(c)))
        .filter(|t| range.contains(t.event_date))
        .filter(|t| contains_ci(&t.text, keyword))
        .collect();
    // Store order is (date, sequence); a stable sort on date alone keeps sequence order
    hits.sort_by(|a, b| b.event_date.cmp(&a.event_date));

    QueryResult::new(hits.into_iter().take(limit).map(TranscriptHit::from).collect()).or_message(
        || format!("No transcripts found for keyword '{keyword}' and company '{company}'"),
    )
}

/// Opening utterances of a ticker's most recent call
pub fn latest_transcript(store: &DataStore, ticker: &str, limit: usize) -> QueryResult<TranscriptHit> {
    let Some(date) = store.latest_call_date(ticker) else {
        return QueryResult::miss(format!("No transcripts for ticker '{ticker}'"));
    };

    QueryResult::new(
        store
            .transcripts()
            .iter()
            .filter(|t| t.ticker.eq_ignore_ascii_case(ticker) && t.event_date == date)
            .take(limit)
            .map(TranscriptHit::from)
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    keyword: String,
    #[serde(default = "default_company")]
    company: String,
    #[serde(default = "default_search_limit")]
    limit: usize,
    since: Option<String>,
    until: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestParams {
    ticker: Option<String>,
    #[serde(default = "default_latest_limit")]
    limit: usize,
}

fn default_company() -> String {
    "all".to_string()
}

fn default_search_limit() -> usize {
    3
}

fn default_latest_limit() -> usize {
    10
}

/// Tool: keyword search across call transcripts
pub struct SearchTranscriptsTool {
    env: ToolEnv,
}

impl SearchTranscriptsTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for SearchTranscriptsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: SearchParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };
        let range = match DateRange::parse(params.since.as_deref(), params.until.as_deref()) {
            Ok(range) => range,
            Err(message) => return Ok(to_json(&QueryResult::<TranscriptHit>::miss(message))),
        };

        let result = search_transcripts(
            &self.env.store,
            &params.keyword,
            &params.company,
            self.env.cap(params.limit),
            range,
        );
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "search_transcripts"
    }

    fn description(&self) -> &str {
        "Search earnings call transcripts for specific topics or keywords. Returns relevant \
         excerpts from the company's and/or competitors' calls, most recent call first."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "keyword": schema::string("Keyword or topic to search for (e.g. 'AI', 'consumption', 'pricing', 'competition')"),
                "company": schema::string_with_default("Company ticker, or 'all' for every company", "all"),
                "limit": schema::integer_with_default("Max results to return", default_search_limit()),
                "since": schema::date("Only calls on or after this date"),
                "until": schema::date("Only calls on or before this date"),
            }),
            &["keyword"],
        )
    }
}

/// Tool: opening of the most recent call
pub struct LatestTranscriptTool {
    env: ToolEnv,
}

impl LatestTranscriptTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for LatestTranscriptTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: LatestParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };

        let ticker = self.env.ticker_or_primary(params.ticker.as_deref());
        let result = latest_transcript(&self.env.store, &ticker, self.env.cap(params.limit));
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "get_latest_transcript"
    }

    fn description(&self) -> &str {
        "Get the opening remarks of a company's most recent earnings call, in speaking order."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Company ticker (defaults to the company preparing for its call)"),
                "limit": schema::integer_with_default("Max utterances to return", default_latest_limit()),
            }),
            &[],
        )
    }
}
