//! Draft questions parsed from model output
//!
//! The question prompts ask the model for blocks of the form
//!
//! ```text
//! QUESTION: Why did free cash flow fall 60% this quarter?
//! SOURCE_BUCKET: 1
//! THREAT_LEVEL: HIGH
//! DATA_POINT: FCF $100M -> $40M
//! ```

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"QUESTION\s*:").expect("valid regex"));

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(THREAT_LEVEL|SOURCE_BUCKET|DATA_POINT)\s*:\s*(.*)$").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl FromStr for ThreatLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|w| !w.is_empty())
            .unwrap_or_default();
        match word.to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Self::High),
            "MEDIUM" | "MED" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            _ => Err(format!("unknown threat level: {s}")),
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        })
    }
}

/// Where an analyst would have found the data behind a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceBucket {
    /// Bucket 1
    FilingsPress,
    /// Bucket 2
    Transcripts,
    /// Bucket 3
    AnalystResearch,
    /// Anything the model wrote that is not a bucket number
    Other(String),
}

impl SourceBucket {
    pub fn parse(raw: &str) -> Self {
        match raw.chars().find(|c| !c.is_whitespace()) {
            Some('1') => Self::FilingsPress,
            Some('2') => Self::Transcripts,
            Some('3') => Self::AnalystResearch,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::FilingsPress => "Filings/Press",
            Self::Transcripts => "Transcripts",
            Self::AnalystResearch => "Analyst Research",
            Self::Other(raw) => raw,
        }
    }
}

/// One anticipated analyst question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftQuestion {
    pub question: String,
    pub threat: Option<ThreatLevel>,
    pub source: Option<SourceBucket>,
    pub data_point: Option<String>,
}

/// Split model output into draft questions
///
/// Text before the first `QUESTION:` marker is ignored, as are blocks whose
/// question line is empty.
pub fn parse_questions(response: &str) -> Vec<DraftQuestion> {
    QUESTION_MARKER
        .split(response)
        .skip(1)
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<DraftQuestion> {
    let mut lines = block.trim().lines();
    let question = clean(lines.next()?);
    if question.is_empty() {
        return None;
    }

    let mut draft = DraftQuestion {
        question,
        threat: None,
        source: None,
        data_point: None,
    };

    for line in lines {
        let Some(caps) = FIELD.captures(line) else {
            continue;
        };
        let value = clean(&caps[2]);
        if value.is_empty() {
            continue;
        }
        match &caps[1] {
            "THREAT_LEVEL" => draft.threat = value.parse().ok(),
            "SOURCE_BUCKET" => draft.source = Some(SourceBucket::parse(&value)),
            _ => draft.data_point = Some(value),
        }
    }

    Some(draft)
}

/// Strip markdown emphasis and placeholder brackets
fn clean(raw: &str) -> String {
    raw.replace(['*', '[', ']'], "").trim().to_string()
}
