//! Typed records loaded from the CSV sources
//!
//! Column headers are upper snake case on disk; serialized output (tool
//! results sent to the model) uses snake case.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fiscal period a metric belongs to
///
/// Ordering is chronological by period end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    pub end_date: NaiveDate,
    pub fiscal_year: i32,
    pub fiscal_quarter: u8,
}

impl Period {
    /// Label in the form "Q3 FY2026"
    pub fn label(&self) -> String {
        format!("Q{} FY{}", self.fiscal_quarter, self.fiscal_year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.end_date)
    }
}

/// Identity of a metric record
///
/// Ticker and metric name are stored upper case, so identities compare the
/// same way lookups match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MetricKey {
    pub ticker: String,
    pub period_end: NaiveDate,
    pub metric: String,
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.ticker, self.period_end, self.metric)
    }
}

/// One reported value of one metric for one company and period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub ticker: String,
    pub period: Period,
    pub metric: String,
    pub value: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filing: Option<String>,
}

impl MetricRecord {
    pub fn key(&self) -> MetricKey {
        MetricKey {
            ticker: self.ticker.to_ascii_uppercase(),
            period_end: self.period.end_date,
            metric: self.metric.to_ascii_uppercase(),
        }
    }
}

/// Raw metrics row as it appears in the file, validated into a [`MetricRecord`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) struct MetricRow {
    pub ticker: String,
    pub fiscal_year: i32,
    pub fiscal_quarter: u8,
    #[serde(deserialize_with = "date")]
    pub period_end_date: NaiveDate,
    pub metric_name: String,
    pub metric_value: f64,
    pub metric_unit: String,
    #[serde(default)]
    pub source_filing: Option<String>,
}

impl TryFrom<MetricRow> for MetricRecord {
    type Error = String;

    fn try_from(row: MetricRow) -> Result<Self, Self::Error> {
        if !(1..=4).contains(&row.fiscal_quarter) {
            return Err(format!(
                "fiscal quarter {} outside 1-4",
                row.fiscal_quarter
            ));
        }
        if !row.metric_value.is_finite() {
            return Err(format!(
                "metric value for {} is not a finite number",
                row.metric_name
            ));
        }
        if row.ticker.is_empty() || row.metric_name.is_empty() {
            return Err("ticker and metric name must not be empty".to_string());
        }

        Ok(Self {
            ticker: row.ticker,
            period: Period {
                end_date: row.period_end_date,
                fiscal_year: row.fiscal_year,
                fiscal_quarter: row.fiscal_quarter,
            },
            metric: row.metric_name,
            value: row.metric_value,
            unit: row.metric_unit,
            source_filing: row.source_filing,
        })
    }
}

/// One utterance of an earnings call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "SCREAMING_SNAKE_CASE"))]
pub struct TranscriptEntry {
    pub ticker: String,
    #[serde(deserialize_with = "date")]
    pub event_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    pub sequence: u32,
    pub speaker: String,
    pub text: String,
}

/// A sell-side analyst's rating and note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "SCREAMING_SNAKE_CASE"))]
pub struct AnalystNote {
    pub ticker: String,
    pub analyst: String,
    pub firm: String,
    pub rating: String,
    #[serde(default)]
    pub price_target: Option<f64>,
    #[serde(deserialize_with = "date")]
    pub rating_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// An SEC filing (10-K, 10-Q, 8-K, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "SCREAMING_SNAKE_CASE"))]
pub struct SecFiling {
    pub ticker: String,
    pub filing_type: String,
    #[serde(deserialize_with = "date")]
    pub filing_date: NaiveDate,
    #[serde(default, deserialize_with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub period_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A company press release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "SCREAMING_SNAKE_CASE"))]
pub struct PressRelease {
    pub ticker: String,
    #[serde(deserialize_with = "date")]
    pub release_date: NaiveDate,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A news headline about any tracked company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "SCREAMING_SNAKE_CASE"))]
pub struct NewsItem {
    pub ticker: String,
    #[serde(deserialize_with = "date")]
    pub news_date: NaiveDate,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Parse `YYYY-MM-DD`, ignoring a trailing time component
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(quarter: u8, value: f64) -> MetricRow {
        MetricRow {
            ticker: "SNOW".to_string(),
            fiscal_year: 2026,
            fiscal_quarter: quarter,
            period_end_date: NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
            metric_name: "NRR_PERCENT".to_string(),
            metric_value: value,
            metric_unit: "%".to_string(),
            source_filing: None,
        }
    }

    #[test]
    fn test_parse_date_accepts_time_suffix() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 31);
        assert_eq!(parse_date("2025-10-31"), expected);
        assert_eq!(parse_date("2025-10-31 00:00:00"), expected);
        assert_eq!(parse_date(" 2025-10-31T12:00:00Z "), expected);
        assert_eq!(parse_date("31/10/2025"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_metric_row_validation() {
        let record = MetricRecord::try_from(row(3, 125.0)).unwrap();
        assert_eq!(record.period.label(), "Q3 FY2026");
        assert_eq!(record.key().to_string(), "SNOW/2025-10-31/NRR_PERCENT");

        assert!(MetricRecord::try_from(row(0, 125.0)).is_err());
        assert!(MetricRecord::try_from(row(5, 125.0)).is_err());
        assert!(MetricRecord::try_from(row(3, f64::NAN)).is_err());
        assert!(MetricRecord::try_from(row(3, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_period_orders_by_end_date() {
        let earlier = Period {
            end_date: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
            fiscal_year: 2026,
            fiscal_quarter: 2,
        };
        let later = Period {
            end_date: NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
            fiscal_year: 2026,
            fiscal_quarter: 3,
        };
        assert!(earlier < later);
        assert_eq!(later.to_string(), "Q3 FY2026 (2025-10-31)");
    }

    #[test]
    fn test_serialized_keys_are_snake_case() {
        let note = AnalystNote {
            ticker: "SNOW".to_string(),
            analyst: "J. Doe".to_string(),
            firm: "Acme".to_string(),
            rating: "Buy".to_string(),
            price_target: Some(250.0),
            rating_date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            notes: None,
        };
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["price_target"], 250.0);
        assert_eq!(value["rating_date"], "2025-11-01");
        assert!(value.get("notes").is_none());
    }
}
