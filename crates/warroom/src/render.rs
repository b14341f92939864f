//! Terminal rendering of war room results

use agent_llm::ToolDefinition;
use agent_runtime::{ExecutorEventHandler, Outcome};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Write as _;

use crate::anomaly::AnomalyReport;
use crate::briefing::DraftQuestion;
use crate::kpis::LatestKpis;
use crate::tools::excerpt;

/// Tool output shown in progress lines is cut to this many characters
const PREVIEW_CHARS: usize = 500;

pub fn format_kpis(kpis: &LatestKpis) -> String {
    let mut out = match &kpis.quarter {
        Some(quarter) => format!("{} latest KPIs ({quarter})\n", kpis.ticker),
        None => format!("{} latest KPIs\n", kpis.ticker),
    };
    if kpis.is_empty() {
        out.push_str("  No KPI data available\n");
        return out;
    }

    let width = kpis.items.iter().map(|k| k.label.len()).max().unwrap_or(0);
    for kpi in &kpis.items {
        let _ = writeln!(out, "  {:<width$}  {}", kpi.label, kpi.value);
    }
    out
}

pub fn format_anomalies(report: &AnomalyReport) -> String {
    let mut out = String::from("Anomalies\n");
    if report.flags.is_empty() {
        out.push_str("  No major anomalies detected\n");
    }
    for flag in &report.flags {
        let _ = writeln!(
            out,
            "  [{}] {} {} {}: {}",
            flag.severity,
            flag.ticker,
            flag.period.label(),
            flag.rule,
            flag.description
        );
    }

    if !report.gaps.is_empty() {
        out.push_str("\nCompetitive gaps\n");
        for gap in &report.gaps {
            let _ = writeln!(
                out,
                "  vs {}: {} {:.1}% vs {:.1}% ({:+.1} pts, {})",
                gap.competitor,
                gap.ticker,
                gap.primary_growth_pct,
                gap.competitor_growth_pct,
                gap.gap_pts,
                if gap.ahead { "ahead" } else { "behind" }
            );
        }
    }
    out
}

/// Numbered questions; falls back to the raw text when nothing parsed
pub fn format_questions(questions: &[DraftQuestion], raw: &str) -> String {
    if questions.is_empty() {
        return format!("{}\n", raw.trim());
    }

    let mut out = String::new();
    for (i, q) in questions.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, q.question);
        if let Some(threat) = q.threat {
            let _ = writeln!(out, "   Threat: {threat}");
        }
        if let Some(source) = &q.source {
            let _ = writeln!(out, "   Source: {}", source.label());
        }
        if let Some(data_point) = &q.data_point {
            let _ = writeln!(out, "   Data:   {data_point}");
        }
        out.push('\n');
    }
    out
}

pub fn format_tools(tools: &[ToolDefinition]) -> String {
    let width = tools.iter().map(|t| t.name.len()).max().unwrap_or(0);
    tools
        .iter()
        .map(|t| format!("{:<width$}  {}\n", t.name, first_sentence(&t.description)))
        .collect()
}

fn first_sentence(text: &str) -> &str {
    text.split_once(". ").map_or(text, |(first, _)| first)
}

pub fn format_error(error: &str) -> String {
    format!("❌ Error: {error}")
}

/// Prints agent research steps to stderr
pub struct ProgressPrinter;

#[async_trait]
impl ExecutorEventHandler for ProgressPrinter {
    async fn on_tool_start(&self, _id: &str, name: &str, input: &Value) {
        eprintln!("🔧 {name} {input}");
    }

    async fn on_tool_done(
        &self,
        _id: &str,
        name: &str,
        result: std::result::Result<&Value, &str>,
        duration_ms: u64,
    ) {
        match result {
            Ok(value) => eprintln!(
                "   ✓ {name} ({duration_ms} ms): {}",
                excerpt(&value.to_string(), PREVIEW_CHARS)
            ),
            Err(e) => eprintln!("   ✗ {name} ({duration_ms} ms): {e}"),
        }
    }

    async fn on_complete(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Finished { .. } => eprintln!("📝 Research complete, drafting...\n"),
            Outcome::Answered { .. } => eprintln!("📝 Done\n"),
        }
    }

    async fn on_error(&self, error: &str) {
        eprintln!("{}", format_error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AnomalyDetector, AnomalyThresholds};
    use crate::briefing::parse_questions;
    use crate::config::WarRoomConfig;
    use crate::store::fixtures;
    use serde_json::json;

    #[test]
    fn test_format_kpis_aligns_labels() {
        let kpis = LatestKpis::from_store(&fixtures::store(), "SNOW");
        let out = format_kpis(&kpis);
        assert!(out.starts_with("SNOW latest KPIs (Q2 FY2026)\n"));
        assert!(out.contains("  FCF              $40.0M\n"));

        let empty = LatestKpis::from_store(&fixtures::store(), "ZZZZ");
        assert_eq!(format_kpis(&empty), "ZZZZ latest KPIs\n  No KPI data available\n");
    }

    #[test]
    fn test_format_anomalies() {
        let store = fixtures::store();
        let thresholds = AnomalyThresholds::default();
        let report = AnomalyDetector::new(&store, &thresholds).analyze(&WarRoomConfig::default());

        let out = format_anomalies(&report);
        assert!(out.contains("  [HIGH] SNOW Q2 FY2026 fcf_decline: "));
        assert!(out.contains("  vs GOOGL: SNOW 31.5% vs 31.7% (-0.2 pts, behind)"));

        assert_eq!(
            format_anomalies(&AnomalyReport::default()),
            "Anomalies\n  No major anomalies detected\n"
        );
    }

    #[test]
    fn test_format_questions() {
        let questions = parse_questions(
            "QUESTION: Why did FCF fall?\nTHREAT_LEVEL: HIGH\nSOURCE_BUCKET: 2\nDATA_POINT: $40M",
        );
        assert_eq!(
            format_questions(&questions, ""),
            "1. Why did FCF fall?\n   Threat: HIGH\n   Source: Transcripts\n   Data:   $40M\n\n"
        );
        assert_eq!(format_questions(&[], "  free text \n"), "free text\n");
    }

    #[test]
    fn test_format_tools_and_error() {
        let tools = vec![
            ToolDefinition::new("check_anomalies", "Detect anomalies. Returns flags.", json!({})),
            ToolDefinition::new("get_sec_filings", "Get filings", json!({})),
        ];
        assert_eq!(
            format_tools(&tools),
            "check_anomalies  Detect anomalies\nget_sec_filings  Get filings\n"
        );
        assert_eq!(format_error("boom"), "❌ Error: boom");
    }
}
