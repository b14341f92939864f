//! Earnings call war room
//!
//! Prepares an investor-relations team for an earnings call. CSV data
//! (metrics, SEC filings, press releases, call transcripts, analyst ratings,
//! competitor news) is loaded once into a [`DataStore`]; a set of read-only
//! query tools expose it to a hosted model, and three agents use those tools
//! to draft:
//!
//! - the toughest analyst questions to expect ([`QuestionAgent`])
//! - executive talking points answering one of them ([`DefenseAgent`])
//! - questions about a topic the team names ([`TopicQuestionGenerator`])
//!
//! A rule-based [`AnomalyDetector`] scans the metrics for moving-average
//! deviations, free-cash-flow drops and net revenue retention weakness, and
//! measures growth against benchmark competitors. Its flags are fed into
//! every final prompt.
//!
//! # Example
//!
//! ```no_run
//! use warroom::{WarRoom, WarRoomConfig};
//!
//! # async fn example() -> warroom::Result<()> {
//! let config = WarRoomConfig::builder()
//!     .company_name("Snowflake")
//!     .primary_ticker("SNOW")
//!     .data_dir("data")
//!     .build()?;
//!
//! let room = WarRoom::load(config)?;
//! println!("{}", room.anomalies(None).to_prompt_text());
//!
//! let room = room.with_env_provider()?;
//! let brief = room
//!     .defense_agent()?
//!     .defend("Why did free cash flow fall 60%?", None)
//!     .await?;
//! println!("{}", brief.text);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod anomaly;
pub mod briefing;
pub mod config;
pub mod error;
pub mod kpis;
pub mod prompts;
pub mod render;
pub mod room;
pub mod store;
pub mod tools;

pub use agents::{
    DefenseAgent, DefenseBrief, QuestionAgent, QuestionBriefing, TopicQuestionGenerator,
    TopicQuestions,
};
pub use anomaly::{AnomalyDetector, AnomalyFlag, AnomalyReport, AnomalyThresholds, Severity};
pub use briefing::{DraftQuestion, SourceBucket, ThreatLevel, parse_questions};
pub use config::WarRoomConfig;
pub use error::{LoadError, Result, WarRoomError};
pub use kpis::LatestKpis;
pub use room::WarRoom;
pub use store::{DataSources, DataStore};
