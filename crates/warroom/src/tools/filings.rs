//! SEC filing and press release tools

use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{QueryResult, ToolEnv, contains_ci, excerpt, parse_params, to_json};
use crate::store::{DataStore, PressRelease, SecFiling};

const SYNOPSIS_CHARS: usize = 200;

/// Filings of `ticker`, newest first, optionally of one type
pub fn sec_filings(
    store: &DataStore,
    ticker: &str,
    filing_type: &str,
    limit: usize,
) -> QueryResult<SecFiling> {
    let filing_type = filing_type.trim();
    let any_type = filing_type.is_empty() || filing_type.eq_ignore_ascii_case("all");

    let mut filings: Vec<&SecFiling> = store
        .filings()
        .iter()
        .filter(|f| f.ticker.eq_ignore_ascii_case(ticker))
        .filter(|f| any_type || f.filing_type.eq_ignore_ascii_case(filing_type))
        .collect();
    filings.sort_by(|a, b| b.filing_date.cmp(&a.filing_date));

    QueryResult::new(filings.into_iter().take(limit).cloned().collect())
        .or_message(|| format!("No SEC filings found for {ticker} of type '{filing_type}'"))
}

/// A press release with its synopsis truncated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseHit {
    pub ticker: String,
    pub release_date: NaiveDate,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&PressRelease> for ReleaseHit {
    fn from(release: &PressRelease) -> Self {
        Self {
            ticker: release.ticker.clone(),
            release_date: release.release_date,
            title: release.title.clone(),
            synopsis: release
                .synopsis
                .as_deref()
                .map(|s| excerpt(s, SYNOPSIS_CHARS)),
            url: release.url.clone(),
        }
    }
}

/// Releases of `ticker` whose title or synopsis mentions `keyword`, newest first
pub fn press_releases(
    store: &DataStore,
    ticker: &str,
    keyword: &str,
    limit: usize,
) -> QueryResult<ReleaseHit> {
    let keyword = keyword.trim();
    let mut releases: Vec<&PressRelease> = store
        .press_releases()
        .iter()
        .filter(|r| r.ticker.eq_ignore_ascii_case(ticker))
        .filter(|r| {
            contains_ci(&r.title, keyword)
                || r.synopsis.as_deref().is_some_and(|s| contains_ci(s, keyword))
        })
        .collect();
    releases.sort_by(|a, b| b.release_date.cmp(&a.release_date));

    QueryResult::new(releases.into_iter().take(limit).map(ReleaseHit::from).collect()).or_message(
        || {
            if keyword.is_empty() {
                format!("No press releases found for {ticker}")
            } else {
                format!("No press releases found for {ticker} matching '{keyword}'")
            }
        },
    )
}

#[derive(Debug, Deserialize)]
struct FilingParams {
    ticker: Option<String>,
    #[serde(default = "default_filing_type")]
    filing_type: String,
    #[serde(default = "default_filing_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct ReleaseParams {
    ticker: Option<String>,
    #[serde(default)]
    keyword: String,
    #[serde(default = "default_release_limit")]
    limit: usize,
}

fn default_filing_type() -> String {
    "all".to_string()
}

fn default_filing_limit() -> usize {
    3
}

fn default_release_limit() -> usize {
    5
}

/// Tool: recent SEC filings
pub struct SecFilingsTool {
    env: ToolEnv,
}

impl SecFilingsTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for SecFilingsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: FilingParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };

        let ticker = self.env.ticker_or_primary(params.ticker.as_deref());
        let result = sec_filings(
            &self.env.store,
            &ticker,
            &params.filing_type,
            self.env.cap(params.limit),
        );
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "get_sec_filings"
    }

    fn description(&self) -> &str {
        "Get recent SEC filings (10-K, 10-Q, 8-K) with filing dates and summaries, newest first."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Company ticker (defaults to the company preparing for its call)"),
                "filing_type": schema::string_with_default("Type of filing: 'all', '10-K', '10-Q', '8-K'", "all"),
                "limit": schema::integer_with_default("Max filings to return", default_filing_limit()),
            }),
            &[],
        )
    }
}

/// Tool: recent press releases
pub struct PressReleasesTool {
    env: ToolEnv,
}

impl PressReleasesTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for PressReleasesTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: ReleaseParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(miss) => return Ok(miss),
        };

        let ticker = self.env.ticker_or_primary(params.ticker.as_deref());
        let result = press_releases(
            &self.env.store,
            &ticker,
            &params.keyword,
            self.env.cap(params.limit),
        );
        Ok(to_json(&result))
    }

    fn name(&self) -> &str {
        "get_press_releases"
    }

    fn description(&self) -> &str {
        "Get recent press releases with titles, dates and summaries, optionally filtered by \
         a keyword in the title or synopsis."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Company ticker (defaults to the company preparing for its call)"),
                "keyword": schema::string_with_default("Optional keyword to filter press releases", ""),
                "limit": schema::integer_with_default("Max releases to return", default_release_limit()),
            }),
            &[],
        )
    }
}
