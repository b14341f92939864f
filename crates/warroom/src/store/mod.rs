//! In-memory data store loaded once from CSV files
//!
//! The store is immutable after construction and shared read-only through
//! `Arc<DataStore>` with the tool layer and the anomaly detector.

mod loader;
pub mod records;

pub use records::{
    AnalystNote, MetricKey, MetricRecord, NewsItem, Period, PressRelease, SecFiling,
    TranscriptEntry, parse_date,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::LoadError;

/// Location and file names of the CSV sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSources {
    pub dir: PathBuf,
    pub metrics: String,
    pub sec_filings: String,
    pub press_releases: String,
    pub transcripts: String,
    pub analyst_ratings: String,
    /// Optional; a missing news file loads as an empty table
    pub news: String,
}

impl Default for DataSources {
    fn default() -> Self {
        Self::new("data")
    }
}

impl DataSources {
    /// Default file names inside `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            metrics: "metrics.csv".to_string(),
            sec_filings: "sec_filings.csv".to_string(),
            press_releases: "press_releases.csv".to_string(),
            transcripts: "transcripts.csv".to_string(),
            analyst_ratings: "analyst_ratings.csv".to_string(),
            news: "news.csv".to_string(),
        }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

/// Raw tables, used to build a store without touching the filesystem
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub metrics: Vec<MetricRecord>,
    pub transcripts: Vec<TranscriptEntry>,
    pub ratings: Vec<AnalystNote>,
    pub filings: Vec<SecFiling>,
    pub press_releases: Vec<PressRelease>,
    pub news: Vec<NewsItem>,
}

/// Read-only tables of every data source
#[derive(Debug, Default)]
pub struct DataStore {
    metrics: Vec<MetricRecord>,
    transcripts: Vec<TranscriptEntry>,
    ratings: Vec<AnalystNote>,
    filings: Vec<SecFiling>,
    press_releases: Vec<PressRelease>,
    news: Vec<NewsItem>,
}

fn same_ticker(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

impl DataStore {
    /// Load every table from `sources`
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] naming the file (and line for row errors) if a
    /// required file is missing or any row fails validation.
    pub fn load(sources: &DataSources) -> Result<Self, LoadError> {
        let metrics = loader::read_metrics(&sources.path(&sources.metrics))?;
        let filings = loader::read_table(&sources.path(&sources.sec_filings))?;
        let press_releases = loader::read_table(&sources.path(&sources.press_releases))?;
        let transcripts = loader::read_table(&sources.path(&sources.transcripts))?;
        let ratings = loader::read_table(&sources.path(&sources.analyst_ratings))?;

        let news_path = sources.path(&sources.news);
        let news = if news_path.is_file() {
            loader::read_table(&news_path)?
        } else {
            info!(path = %news_path.display(), "No news file, continuing without news");
            Vec::new()
        };

        let store = Self::from_tables(Tables {
            metrics,
            transcripts,
            ratings,
            filings,
            press_releases,
            news,
        });

        info!(
            dir = %sources.dir.display(),
            metrics = store.metrics.len(),
            transcripts = store.transcripts.len(),
            ratings = store.ratings.len(),
            filings = store.filings.len(),
            press_releases = store.press_releases.len(),
            news = store.news.len(),
            "Data store loaded"
        );
        Ok(store)
    }

    /// Build a store from in-memory tables
    ///
    /// Transcript entries are ordered by call date, then sequence within the
    /// call. Every other table keeps its input order.
    pub fn from_tables(tables: Tables) -> Self {
        let mut transcripts = tables.transcripts;
        transcripts.sort_by(|a, b| {
            (a.event_date, a.sequence).cmp(&(b.event_date, b.sequence))
        });

        Self {
            metrics: tables.metrics,
            transcripts,
            ratings: tables.ratings,
            filings: tables.filings,
            press_releases: tables.press_releases,
            news: tables.news,
        }
    }

    pub fn metrics(&self) -> &[MetricRecord] {
        &self.metrics
    }

    pub fn transcripts(&self) -> &[TranscriptEntry] {
        &self.transcripts
    }

    pub fn ratings(&self) -> &[AnalystNote] {
        &self.ratings
    }

    pub fn filings(&self) -> &[SecFiling] {
        &self.filings
    }

    pub fn press_releases(&self) -> &[PressRelease] {
        &self.press_releases
    }

    pub fn news(&self) -> &[NewsItem] {
        &self.news
    }

    /// Every ticker appearing in any table, sorted
    pub fn tickers(&self) -> Vec<String> {
        let tickers: BTreeSet<&str> = self
            .metrics
            .iter()
            .map(|r| r.ticker.as_str())
            .chain(self.transcripts.iter().map(|t| t.ticker.as_str()))
            .chain(self.ratings.iter().map(|r| r.ticker.as_str()))
            .chain(self.filings.iter().map(|f| f.ticker.as_str()))
            .chain(self.press_releases.iter().map(|p| p.ticker.as_str()))
            .chain(self.news.iter().map(|n| n.ticker.as_str()))
            .collect();
        tickers.into_iter().map(str::to_string).collect()
    }

    /// Tickers that have at least one metric record, sorted
    pub fn metric_tickers(&self) -> Vec<String> {
        let tickers: BTreeSet<&str> = self.metrics.iter().map(|r| r.ticker.as_str()).collect();
        tickers.into_iter().map(str::to_string).collect()
    }

    pub fn has_ticker(&self, ticker: &str) -> bool {
        self.tickers().iter().any(|t| same_ticker(t, ticker))
    }

    /// Metric records of one ticker
    pub fn metrics_for<'a, 'b>(
        &'a self,
        ticker: &'b str,
    ) -> impl Iterator<Item = &'a MetricRecord> + use<'a, 'b> {
        self.metrics.iter().filter(move |r| same_ticker(&r.ticker, ticker))
    }

    /// Metric names reported by a ticker, sorted
    pub fn metric_names(&self, ticker: &str) -> Vec<String> {
        let names: BTreeSet<&str> = self.metrics_for(ticker).map(|r| r.metric.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// One metric of one ticker in chronological order
    pub fn metric_series(&self, ticker: &str, metric: &str) -> Vec<&MetricRecord> {
        let mut series: Vec<&MetricRecord> = self
            .metrics_for(ticker)
            .filter(|r| r.metric.eq_ignore_ascii_case(metric))
            .collect();
        series.sort_by_key(|r| r.period);
        series
    }

    /// Distinct periods of a ticker, most recent first
    pub fn periods(&self, ticker: &str) -> Vec<Period> {
        let periods: BTreeSet<Period> = self.metrics_for(ticker).map(|r| r.period).collect();
        periods.into_iter().rev().collect()
    }

    pub fn latest_period(&self, ticker: &str) -> Option<Period> {
        self.metrics_for(ticker).map(|r| r.period).max()
    }

    /// Value of one metric at one period end
    pub fn metric_value(&self, ticker: &str, period_end: NaiveDate, metric: &str) -> Option<f64> {
        self.metrics_for(ticker)
            .find(|r| r.period.end_date == period_end && r.metric.eq_ignore_ascii_case(metric))
            .map(|r| r.value)
    }

    /// Date of a ticker's most recent earnings call
    pub fn latest_call_date(&self, ticker: &str) -> Option<NaiveDate> {
        self.transcripts
            .iter()
            .filter(|t| same_ticker(&t.ticker, ticker))
            .map(|t| t.event_date)
            .max()
    }
}

/// Check that a directory holds every required source file
pub fn missing_sources(sources: &DataSources) -> Vec<PathBuf> {
    [
        &sources.metrics,
        &sources.sec_filings,
        &sources.press_releases,
        &sources.transcripts,
        &sources.analyst_ratings,
    ]
    .into_iter()
    .map(|file| sources.path(file))
    .filter(|path| !Path::is_file(path))
    .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared CSV fixtures for tests across the crate

    use super::*;
    use std::fs;
    use tempfile::TempDir;

    pub const METRICS: &str = "\
TICKER,FISCAL_YEAR,FISCAL_QUARTER,PERIOD_END_DATE,METRIC_NAME,METRIC_VALUE,METRIC_UNIT,SOURCE_FILING
SNOW,2025,2,2024-07-31,PRODUCT_REVENUE_M,829,USD_M,10-Q
SNOW,2025,3,2024-10-31,PRODUCT_REVENUE_M,900,USD_M,10-Q
SNOW,2025,4,2025-01-31,PRODUCT_REVENUE_M,943,USD_M,10-K
SNOW,2026,1,2025-04-30,PRODUCT_REVENUE_M,997,USD_M,10-Q
SNOW,2026,2,2025-07-31,PRODUCT_REVENUE_M,1090,USD_M,10-Q
SNOW,2025,2,2024-07-31,FCF_IN_MILLIONS,64,USD_M,10-Q
SNOW,2025,3,2024-10-31,FCF_IN_MILLIONS,79,USD_M,10-Q
SNOW,2025,4,2025-01-31,FCF_IN_MILLIONS,90,USD_M,10-K
SNOW,2026,1,2025-04-30,FCF_IN_MILLIONS,100,USD_M,10-Q
SNOW,2026,2,2025-07-31,FCF_IN_MILLIONS,40,USD_M,10-Q
SNOW,2025,2,2024-07-31,NRR_PERCENT,127,%,10-Q
SNOW,2025,3,2024-10-31,NRR_PERCENT,127,%,10-Q
SNOW,2025,4,2025-01-31,NRR_PERCENT,126,%,10-K
SNOW,2026,1,2025-04-30,NRR_PERCENT,124,%,10-Q
SNOW,2026,2,2025-07-31,NRR_PERCENT,108,%,10-Q
SNOW,2026,2,2025-07-31,CUSTOMERS_1M_PLUS,654,COUNT,10-Q
SNOW,2026,2,2025-07-31,RPO_M,6900,USD_M,10-Q
SNOW,2026,2,2025-07-31,TOTAL_REVENUE_M,1145,USD_M,10-Q
SNOW,2026,2,2025-07-31,GROSS_MARGIN_PERCENT,75,%,10-Q
GOOGL,2024,2,2024-06-30,CLOUD_REVENUE,10347,USD_M,
GOOGL,2024,3,2024-09-30,CLOUD_REVENUE,11353,USD_M,
GOOGL,2024,4,2024-12-31,CLOUD_REVENUE,11955,USD_M,
GOOGL,2025,1,2025-03-31,CLOUD_REVENUE,12260,USD_M,
GOOGL,2025,2,2025-06-30,CLOUD_REVENUE,13624,USD_M,
DDOG,2025,2,2025-06-30,TOTAL_REVENUE_M,827,USD_M,
";

    pub const FILINGS: &str = "\
TICKER,FILING_TYPE,FILING_DATE,PERIOD_END_DATE,URL,SUMMARY
SNOW,10-K,2025-03-21,2025-01-31,https://sec.example/10k,Annual report
SNOW,10-Q,2025-05-30,2025-04-30,,Q1 report
SNOW,10-Q,2025-08-29,2025-07-31,,Q2 report
";

    pub const PRESS: &str = "\
TICKER,RELEASE_DATE,TITLE,SYNOPSIS,URL
SNOW,2025-08-27,Snowflake Reports Q2 Results,Product revenue grew 32%,
SNOW,2025-06-02,Snowflake launches Cortex AI agents,AI features for enterprise data,
SNOW,2025-05-21,Snowflake Reports Q1 Results,Product revenue grew 26%,
";

    pub const TRANSCRIPTS: &str = "\
TICKER,EVENT_DATE,EVENT_TYPE,SEQUENCE,SPEAKER,TEXT
SNOW,2025-08-27,Q2 FY2026 Earnings Call,2,CFO,Consumption trends were stable and AI workloads grew.
SNOW,2025-08-27,Q2 FY2026 Earnings Call,1,CEO,We delivered a strong quarter.
SNOW,2025-05-21,Q1 FY2026 Earnings Call,1,CEO,Consumption was healthy in Q1.
DDOG,2025-08-07,Q2 2025 Earnings Call,1,CEO,AI-native customers are 12% of revenue.
";

    pub const RATINGS: &str = "\
TICKER,ANALYST,FIRM,RATING,PRICE_TARGET,RATING_DATE,NOTES
SNOW,A. Analyst,Alpha Securities,Buy,260,2025-08-28,Watching NRR
SNOW,B. Banker,Beta Capital,Hold,200,2025-09-02,FCF volatility
SNOW,C. Critic,Gamma Research,Sell,,2025-07-15,Competition from hyperscalers
DDOG,D. Dev,Alpha Securities,Buy,150,2025-08-08,
";

    pub const NEWS: &str = "\
TICKER,NEWS_DATE,HEADLINE,SUMMARY,SOURCE
DDOG,2025-09-10,Datadog expands AI observability,New LLM monitoring,Wire
MDB,2025-09-01,MongoDB beats estimates,Atlas growth,Wire
SNOW,2025-09-05,Snowflake hosts investor day,Targets reiterated,Wire
";

    /// Write the full fixture set into a fresh directory
    pub fn write_all(dir: &TempDir) -> DataSources {
        let sources = DataSources::new(dir.path());
        for (file, contents) in [
            (&sources.metrics, METRICS),
            (&sources.sec_filings, FILINGS),
            (&sources.press_releases, PRESS),
            (&sources.transcripts, TRANSCRIPTS),
            (&sources.analyst_ratings, RATINGS),
            (&sources.news, NEWS),
        ] {
            fs::write(sources.path(file), contents).unwrap();
        }
        sources
    }

    /// Loaded fixture store
    pub fn store() -> DataStore {
        let dir = TempDir::new().unwrap();
        let sources = write_all(&dir);
        DataStore::load(&sources).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_counts_every_row() {
        let dir = TempDir::new().unwrap();
        let sources = fixtures::write_all(&dir);
        let store = DataStore::load(&sources).unwrap();

        assert_eq!(store.metrics().len(), 25);
        assert_eq!(store.filings().len(), 3);
        assert_eq!(store.press_releases().len(), 3);
        assert_eq!(store.transcripts().len(), 4);
        assert_eq!(store.ratings().len(), 4);
        assert_eq!(store.news().len(), 3);
        assert!(missing_sources(&sources).is_empty());
    }

    #[test]
    fn test_news_file_is_optional_but_others_are_not() {
        let dir = TempDir::new().unwrap();
        let sources = fixtures::write_all(&dir);

        fs::remove_file(sources.path(&sources.news)).unwrap();
        let store = DataStore::load(&sources).unwrap();
        assert!(store.news().is_empty());

        fs::remove_file(sources.path(&sources.transcripts)).unwrap();
        let err = DataStore::load(&sources).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile { .. }));
        assert!(err.to_string().contains("transcripts.csv"));
        assert_eq!(missing_sources(&sources).len(), 1);
    }

    #[test]
    fn test_transcripts_ordered_by_date_then_sequence() {
        let store = fixtures::store();
        let order: Vec<(String, u32)> = store
            .transcripts()
            .iter()
            .map(|t| (t.event_date.to_string(), t.sequence))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2025-05-21".to_string(), 1),
                ("2025-08-07".to_string(), 1),
                ("2025-08-27".to_string(), 1),
                ("2025-08-27".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_series_and_periods() {
        let store = fixtures::store();

        let fcf: Vec<f64> = store
            .metric_series("snow", "FCF_IN_MILLIONS")
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(fcf, vec![64.0, 79.0, 90.0, 100.0, 40.0]);

        let periods = store.periods("SNOW");
        assert_eq!(periods.len(), 5);
        assert_eq!(periods[0].label(), "Q2 FY2026");
        assert_eq!(store.latest_period("SNOW"), Some(periods[0]));

        let end = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        assert_eq!(store.metric_value("SNOW", end, "RPO_M"), Some(6900.0));
        assert_eq!(store.metric_value("SNOW", end, "NOPE"), None);

        assert!(store.has_ticker("mdb"));
        assert!(!store.has_ticker("ZZZZ"));
        assert_eq!(store.metric_tickers(), vec!["DDOG", "GOOGL", "SNOW"]);
        assert_eq!(
            store.latest_call_date("SNOW"),
            NaiveDate::from_ymd_opt(2025, 8, 27)
        );
    }
}
