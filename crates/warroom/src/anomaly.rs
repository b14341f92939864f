//! Rule-based anomaly detection over the metrics table
//!
//! Rules are independent and evaluated for every ticker in scope. Emitted
//! flags are ordered by rule, then period end date, then ticker, then metric,
//! and no two flags share the same rule and referenced records.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::config::WarRoomConfig;
use crate::error::{Result, WarRoomError};
use crate::store::{DataStore, MetricKey, MetricRecord, Period};

/// Metrics watched by the moving-average rule by default
pub const DEFAULT_MONITORED_METRICS: [&str; 7] = [
    "PRODUCT_REVENUE_M",
    "TOTAL_REVENUE_M",
    "RPO_M",
    "NRR_PERCENT",
    "CUSTOMERS_1M_PLUS",
    "FCF_IN_MILLIONS",
    "GROSS_MARGIN_PERCENT",
];

/// Thresholds for every rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    /// Percent below the trailing mean that raises a MEDIUM flag
    pub moving_average_medium_pct: f64,
    /// Percent below the trailing mean that raises a HIGH flag
    pub moving_average_high_pct: f64,
    /// Number of preceding periods averaged
    pub moving_average_window: usize,
    pub fcf_decline_medium_pct: f64,
    pub fcf_decline_high_pct: f64,
    /// NRR below this is flagged MEDIUM
    pub nrr_floor: f64,
    /// NRR below this is flagged HIGH
    pub nrr_critical_floor: f64,
    /// Consecutive quarter-over-quarter NRR declines that raise a flag
    pub nrr_decline_quarters: usize,
    pub monitored_metrics: Vec<String>,
    pub fcf_metric: String,
    pub nrr_metric: String,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            moving_average_medium_pct: 20.0,
            moving_average_high_pct: 30.0,
            moving_average_window: 4,
            fcf_decline_medium_pct: 20.0,
            fcf_decline_high_pct: 30.0,
            nrr_floor: 110.0,
            nrr_critical_floor: 100.0,
            nrr_decline_quarters: 3,
            monitored_metrics: DEFAULT_MONITORED_METRICS
                .iter()
                .map(ToString::to_string)
                .collect(),
            fcf_metric: "FCF_IN_MILLIONS".to_string(),
            nrr_metric: "NRR_PERCENT".to_string(),
        }
    }
}

impl AnomalyThresholds {
    /// Validate the thresholds
    pub fn validate(&self) -> Result<()> {
        let pairs = [
            (
                "moving average",
                self.moving_average_medium_pct,
                self.moving_average_high_pct,
            ),
            (
                "FCF decline",
                self.fcf_decline_medium_pct,
                self.fcf_decline_high_pct,
            ),
        ];
        for (rule, medium, high) in pairs {
            if !(medium.is_finite() && high.is_finite()) || medium <= 0.0 {
                return Err(WarRoomError::Config(format!(
                    "{rule} thresholds must be positive numbers"
                )));
            }
            if high < medium {
                return Err(WarRoomError::Config(format!(
                    "{rule} HIGH threshold ({high}) is below the MEDIUM threshold ({medium})"
                )));
            }
        }

        if self.moving_average_window == 0 {
            return Err(WarRoomError::Config(
                "moving_average_window must be greater than 0".to_string(),
            ));
        }
        if self.nrr_decline_quarters == 0 {
            return Err(WarRoomError::Config(
                "nrr_decline_quarters must be greater than 0".to_string(),
            ));
        }
        if self.nrr_critical_floor > self.nrr_floor {
            return Err(WarRoomError::Config(format!(
                "NRR critical floor ({}) is above the NRR floor ({})",
                self.nrr_critical_floor, self.nrr_floor
            )));
        }

        Ok(())
    }
}

/// Rule identifiers, ordered as the rules are defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    MovingAverageDeviation,
    FcfDecline,
    NrrBelowFloor,
    NrrConsecutiveDecline,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MovingAverageDeviation => "moving_average_deviation",
            Self::FcfDecline => "fcf_decline",
            Self::NrrBelowFloor => "nrr_below_floor",
            Self::NrrConsecutiveDecline => "nrr_consecutive_decline",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        })
    }
}

/// A threshold crossing found by one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyFlag {
    pub rule: RuleId,
    pub severity: Severity,
    pub ticker: String,
    pub metric: String,
    /// Period of the most recent referenced record
    pub period: Period,
    pub current: f64,
    pub baseline: f64,
    pub deviation_pct: f64,
    pub description: String,
    /// Identities of the records the flag was derived from
    pub records: Vec<MetricKey>,
}

/// Year-over-year growth of the primary company against one benchmark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitiveGap {
    pub ticker: String,
    pub competitor: String,
    pub metric: String,
    pub primary_growth_pct: f64,
    pub competitor_growth_pct: f64,
    /// Primary growth minus competitor growth, in percentage points
    pub gap_pts: f64,
    pub ahead: bool,
}

/// Tickers a detector run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Ticker(String),
}

/// Flags and gaps of one detector run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnomalyReport {
    pub flags: Vec<AnomalyFlag>,
    pub gaps: Vec<CompetitiveGap>,
}

impl AnomalyReport {
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.gaps.is_empty()
    }

    pub fn high_count(&self) -> usize {
        self.flags
            .iter()
            .filter(|f| f.severity == Severity::High)
            .count()
    }

    /// Plain-text summary embedded in agent prompts
    pub fn to_prompt_text(&self) -> String {
        let mut text = String::from("ANOMALIES:\n");
        if self.flags.is_empty() {
            text.push_str("No major anomalies detected\n");
        }
        for flag in &self.flags {
            text.push_str(&format!(
                "- [{}] {} {}: {}\n",
                flag.severity,
                flag.ticker,
                flag.period.label(),
                flag.description
            ));
        }

        if !self.gaps.is_empty() {
            text.push_str("\nCOMPETITIVE GAPS:\n");
            for gap in &self.gaps {
                text.push_str(&format!(
                    "- vs {}: {} {:.1}% vs {:.1}% ({})\n",
                    gap.competitor,
                    gap.ticker,
                    gap.primary_growth_pct,
                    gap.competitor_growth_pct,
                    if gap.ahead { "ahead" } else { "behind" }
                ));
            }
        }

        text
    }
}

/// Applies the threshold rules to a [`DataStore`]
pub struct AnomalyDetector<'a> {
    store: &'a DataStore,
    thresholds: &'a AnomalyThresholds,
}

impl<'a> AnomalyDetector<'a> {
    pub fn new(store: &'a DataStore, thresholds: &'a AnomalyThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Run every rule over the tickers in `scope`
    pub fn detect(&self, scope: &Scope) -> Vec<AnomalyFlag> {
        let tickers = match scope {
            Scope::All => self.store.metric_tickers(),
            Scope::Ticker(ticker) => vec![ticker.clone()],
        };

        let mut flags = Vec::new();
        for ticker in &tickers {
            self.moving_average_deviation(ticker, &mut flags);
            self.fcf_decline(ticker, &mut flags);
            self.nrr_below_floor(ticker, &mut flags);
            self.nrr_consecutive_decline(ticker, &mut flags);
        }

        flags.sort_by(|a, b| {
            (a.rule, a.period.end_date, &a.ticker, &a.metric)
                .cmp(&(b.rule, b.period.end_date, &b.ticker, &b.metric))
        });
        let mut seen = HashSet::new();
        flags.retain(|f| seen.insert((f.rule, f.records.clone())));

        debug!(tickers = tickers.len(), flags = flags.len(), "Anomaly scan complete");
        flags
    }

    /// Year-over-year growth of `primary`'s `metric` against each benchmark
    pub fn competitive_gaps(
        &self,
        primary: &str,
        metric: &str,
        benchmarks: &[(String, String)],
    ) -> Vec<CompetitiveGap> {
        let Some(primary_growth) = self.yoy_growth(primary, metric) else {
            return Vec::new();
        };

        benchmarks
            .iter()
            .filter_map(|(competitor, competitor_metric)| {
                let competitor_growth = self.yoy_growth(competitor, competitor_metric)?;
                let gap = primary_growth - competitor_growth;
                Some(CompetitiveGap {
                    ticker: primary.to_string(),
                    competitor: competitor.clone(),
                    metric: competitor_metric.clone(),
                    primary_growth_pct: round1(primary_growth),
                    competitor_growth_pct: round1(competitor_growth),
                    gap_pts: round1(gap),
                    ahead: gap > 0.0,
                })
            })
            .collect()
    }

    /// Flags for the primary ticker plus its competitive gaps
    pub fn analyze(&self, config: &WarRoomConfig) -> AnomalyReport {
        AnomalyReport {
            flags: self.detect(&Scope::Ticker(config.primary_ticker.clone())),
            gaps: self.competitive_gaps(
                &config.primary_ticker,
                &config.revenue_metric,
                &config.benchmarks,
            ),
        }
    }

    fn yoy_growth(&self, ticker: &str, metric: &str) -> Option<f64> {
        yoy_growth(&self.store.metric_series(ticker, metric))
    }

    fn moving_average_deviation(&self, ticker: &str, flags: &mut Vec<AnomalyFlag>) {
        let window = self.thresholds.moving_average_window;
        for metric in &self.thresholds.monitored_metrics {
            let series = self.store.metric_series(ticker, metric);
            if series.len() < window + 1 {
                continue;
            }

            let recent = &series[series.len() - window - 1..];
            let (latest, preceding) = (recent[window], &recent[..window]);
            let mean = preceding.iter().map(|r| r.value).sum::<f64>() / window as f64;
            if mean == 0.0 {
                continue;
            }

            let deviation = (mean - latest.value) / mean.abs() * 100.0;
            if deviation <= self.thresholds.moving_average_medium_pct {
                continue;
            }

            flags.push(flag(
                RuleId::MovingAverageDeviation,
                severity(deviation, self.thresholds.moving_average_high_pct),
                latest,
                mean,
                deviation,
                format!(
                    "{} is {deviation:.0}% below {window}Q average",
                    title(&latest.metric)
                ),
                recent,
            ));
        }
    }

    fn fcf_decline(&self, ticker: &str, flags: &mut Vec<AnomalyFlag>) {
        let series = self.store.metric_series(ticker, &self.thresholds.fcf_metric);
        for pair in series.windows(2) {
            let (previous, current) = (pair[0], pair[1]);
            if previous.value <= 0.0 {
                continue;
            }

            let decline = (previous.value - current.value) / previous.value * 100.0;
            if decline <= self.thresholds.fcf_decline_medium_pct {
                continue;
            }

            flags.push(flag(
                RuleId::FcfDecline,
                severity(decline, self.thresholds.fcf_decline_high_pct),
                current,
                previous.value,
                decline,
                format!(
                    "{} fell {decline:.0}% quarter over quarter: {:.1} → {:.1}",
                    title(&current.metric),
                    previous.value,
                    current.value
                ),
                pair,
            ));
        }
    }

    fn nrr_below_floor(&self, ticker: &str, flags: &mut Vec<AnomalyFlag>) {
        let floor = self.thresholds.nrr_floor;
        for record in self.store.metric_series(ticker, &self.thresholds.nrr_metric) {
            if record.value >= floor {
                continue;
            }

            let severity = if record.value < self.thresholds.nrr_critical_floor {
                Severity::High
            } else {
                Severity::Medium
            };
            flags.push(flag(
                RuleId::NrrBelowFloor,
                severity,
                record,
                floor,
                (floor - record.value) / floor * 100.0,
                format!("NRR at {:.0}% is below the {floor:.0}% floor", record.value),
                &[record],
            ));
        }
    }

    fn nrr_consecutive_decline(&self, ticker: &str, flags: &mut Vec<AnomalyFlag>) {
        let quarters = self.thresholds.nrr_decline_quarters;
        let series = self.store.metric_series(ticker, &self.thresholds.nrr_metric);
        if series.len() < quarters + 1 {
            return;
        }

        let window = &series[series.len() - quarters - 1..];
        if !window.windows(2).all(|pair| pair[1].value < pair[0].value) {
            return;
        }

        let (first, last) = (window[0], window[quarters]);
        let deviation = if first.value == 0.0 {
            0.0
        } else {
            (first.value - last.value) / first.value * 100.0
        };
        flags.push(flag(
            RuleId::NrrConsecutiveDecline,
            Severity::High,
            last,
            first.value,
            deviation,
            format!(
                "NRR declining for {quarters} quarters: {:.0}% → {:.0}%",
                first.value, last.value
            ),
            window,
        ));
    }
}

fn flag(
    rule: RuleId,
    severity: Severity,
    current: &MetricRecord,
    baseline: f64,
    deviation_pct: f64,
    description: String,
    records: &[&MetricRecord],
) -> AnomalyFlag {
    AnomalyFlag {
        rule,
        severity,
        ticker: current.ticker.clone(),
        metric: current.metric.clone(),
        period: current.period,
        current: round1(current.value),
        baseline: round1(baseline),
        deviation_pct: round1(deviation_pct),
        description,
        records: records.iter().map(|r| r.key()).collect(),
    }
}

fn severity(deviation: f64, high: f64) -> Severity {
    if deviation > high {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Growth of the latest value over the value four periods earlier
///
/// `None` with fewer than five points or a zero base.
pub(crate) fn yoy_growth(series: &[&MetricRecord]) -> Option<f64> {
    if series.len() < 5 {
        return None;
    }
    let latest = series[series.len() - 1].value;
    let base = series[series.len() - 5].value;
    if base == 0.0 {
        return None;
    }
    Some((latest - base) / base.abs() * 100.0)
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// "FCF_IN_MILLIONS" -> "Fcf In Millions"
fn title(metric: &str) -> String {
    metric
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
