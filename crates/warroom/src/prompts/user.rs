//! Opening requests and final generation prompts

use agent_prompt::{JinjaTemplate, Result};

pub const QUESTION_REQUEST: &str = "warroom.user.question_request";
pub const QUESTION_FINAL: &str = "warroom.user.question_final";
pub const DEFENSE_REQUEST: &str = "warroom.user.defense_request";
pub const DEFENSE_FINAL: &str = "warroom.user.defense_final";
pub const TOPIC_QUESTIONS: &str = "warroom.user.topic_questions";

// ============================================================================
// Question Agent
// ============================================================================

pub fn question_request() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        QUESTION_REQUEST,
        "Research {{ company }}'s data and generate {{ count }} tough analyst questions.",
    )
}

/// Final one-shot prompt once research is done
///
/// Variables: `company`, `quarter`, `count`, `findings`, `actual_data`,
/// `kpis`, `anomalies`.
pub fn question_final() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        QUESTION_FINAL,
        r#"Generate {{ count }} tough questions that Wall Street analysts will likely ask {{ company }}'s executives on the upcoming earnings call.

PURPOSE: Help {{ company }}'s IR team prepare responses for the LATEST quarter{% if quarter %} ({{ quarter }}){% endif %}.

CRITICAL - LATEST DATA ONLY:
- Focus on the MOST RECENT quarter
- Current metrics:
{{ kpis }}
- Do NOT reference old quarters

QUESTION STYLE - Make them COMPARATIVE and SPECIFIC:
- Compare {{ company }} to competitors
- Reference the CURRENT quarter's anomalies
- Cite exact numbers from the LATEST data
- Ask "why" and "how" questions that probe current weaknesses

AVOID:
- Questions about old/historical quarters
- Generic questions like "How is growth?"

RULES:
- Only use numbers from the data below, don't make up numbers

CURRENT FLAGS:
{{ anomalies }}

AGENT SUMMARY:
{{ findings }}

ACTUAL DATA (use these exact numbers):
{{ actual_data if actual_data else "No tool output was collected" }}

FORMAT (follow exactly):
QUESTION: [Sharp comparative question with specific data] (Source citation)
SOURCE_BUCKET: [1=Filings/Press, 2=Transcripts, 3=Analyst Research]
THREAT_LEVEL: [HIGH, MEDIUM, or LOW]
DATA_POINT: [The exact data point used]

Generate {{ count }} questions:"#,
    )
}

// ============================================================================
// Defense Agent
// ============================================================================

pub fn defense_request() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        DEFENSE_REQUEST,
        "Research and defend against this question: {{ question }}",
    )
}

/// Final one-shot prompt producing the executive response
///
/// Variables: `company`, `question`, `talking_points`, `actual_data`, `kpis`,
/// `anomalies`.
pub fn defense_final() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        DEFENSE_FINAL,
        r"Draft an executive-ready response for {{ company }}'s CFO or CEO to deliver on the earnings Q&A.

ANALYST QUESTION: {{ question }}

TALKING POINTS:
{{ talking_points }}

ACTUAL DATA (use these exact numbers):
{{ actual_data if actual_data else 'No tool output was collected' }}

CURRENT METRICS:
{{ kpis }}

CURRENT FLAGS:
{{ anomalies }}

RESPONSE GUIDELINES:
1. Acknowledge the concern, then counter with data
2. KEEP BULLET POINTS SHORT - max 15 words each, numbers first
3. NEVER use backticks or code formatting - write $50.5M not `$50.5M`

FORMAT:
**Key Talking Points:**
- [Number] - [Brief explanation, max 15 words]
- [Number] - [Brief explanation, max 15 words]
- [Number] - [Brief explanation, max 15 words]

**Suggested Response:**
[2 sentences max - acknowledge concern, give key counter-point]

Generate the response:",
    )
}

// ============================================================================
// Topic Question Generator
// ============================================================================

/// Variables: `company`, `topic`, `count`, `kpis`, `anomalies`.
pub fn topic_questions() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        TOPIC_QUESTIONS,
        r#"Generate {{ count }} specific, tough analyst questions about this topic: "{{ topic }}"

CONTEXT - {{ company }}'s latest metrics:
{{ kpis }}

CURRENT FLAGS:
{{ anomalies }}

RULES:
- Questions should be specific and use real numbers
- Questions should be what Wall Street analysts would ask
- Include a source citation in parentheses

FORMAT (exactly):
QUESTION: [Specific question with data] (Source)
THREAT_LEVEL: [HIGH/MEDIUM/LOW]
SOURCE_BUCKET: [1=Filings, 2=Transcripts, 3=Research]
DATA_POINT: [Key data point]

Generate {{ count }} questions:"#,
    )
}
