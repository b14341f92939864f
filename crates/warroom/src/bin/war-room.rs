//! Earnings call war room CLI
//!
//! # Usage
//!
//! ```bash
//! export ANTHROPIC_API_KEY="..."
//!
//! war-room --data-dir data kpis
//! war-room anomalies
//! war-room anomalies DDOG
//! war-room anomalies --all
//! war-room tool get_metric_trend --input '{"metric": "NRR_PERCENT"}'
//! war-room questions
//! war-room defend "Why did free cash flow fall 60%?"
//! war-room topic "AI monetization"
//! ```

use agent_utils::{EnvConfig, LogFormat, init_tracing};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use warroom::render::{
    ProgressPrinter, format_anomalies, format_error, format_kpis, format_questions, format_tools,
};
use warroom::{WarRoom, WarRoomConfig};

#[derive(Parser, Debug)]
#[command(name = "war-room", version)]
#[command(about = "Prepare for an earnings call: anticipate analyst questions and draft answers")]
struct Cli {
    /// Directory holding the CSV sources
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Ticker of the company preparing for its call
    #[arg(long, global = true)]
    ticker: Option<String>,

    /// Company name used in prompts
    #[arg(long, global = true)]
    company: Option<String>,

    /// Model identifier
    #[arg(long, global = true)]
    model: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline KPIs of the latest quarter
    Kpis,
    /// Anomaly flags, plus competitive gaps for the primary ticker
    Anomalies {
        /// Ticker to scan (defaults to the primary ticker)
        #[arg(value_name = "TICKER")]
        symbol: Option<String>,
        /// Scan every ticker in the metrics table
        #[arg(long, conflicts_with = "symbol")]
        all: bool,
    },
    /// List the data tools
    Tools,
    /// Run one data tool directly
    Tool {
        name: String,
        /// JSON input for the tool
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Research the data and draft the toughest analyst questions
    Questions,
    /// Draft executive talking points for an analyst question
    Defend { question: String },
    /// Draft questions about a topic
    Topic { topic: String },
}

impl Command {
    /// Commands that call the text-generation service
    fn needs_model(&self) -> bool {
        matches!(
            self,
            Command::Questions | Command::Defend { .. } | Command::Topic { .. }
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = EnvConfig::from_env();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format, &env.log_filter);

    match run(cli, &env).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format_error(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli, env: &EnvConfig) -> anyhow::Result<WarRoomConfig> {
    let mut builder = WarRoomConfig::builder();
    if let Some(dir) = &cli.data_dir {
        builder = builder.data_dir(dir.clone());
    }
    if let Some(ticker) = &cli.ticker {
        builder = builder.primary_ticker(ticker.clone());
    }
    if let Some(company) = &cli.company {
        builder = builder.company_name(company.clone());
    }
    if let Some(model) = &cli.model {
        builder = builder.model(model.clone());
    }
    Ok(builder.with_env(env).build()?)
}

/// Fail before loading data when a model command has no API key
fn check_api_key(command: &Command, env: &EnvConfig) -> anyhow::Result<()> {
    if command.needs_model() && !env.has_api_key() {
        anyhow::bail!("ANTHROPIC_API_KEY is not set; this command needs the text-generation service");
    }
    Ok(())
}

fn print<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

async fn run(cli: Cli, env: &EnvConfig) -> anyhow::Result<()> {
    check_api_key(&cli.command, env)?;
    let config = build_config(&cli, env)?;
    info!(
        data_dir = %config.data.dir.display(),
        ticker = %config.primary_ticker,
        "Loading war room"
    );
    let room = WarRoom::load(config).context("failed to load data")?;
    let json = cli.json;

    match cli.command {
        Command::Kpis => {
            let kpis = room.kpis();
            print(json, &kpis, || format_kpis(&kpis))
        }
        Command::Anomalies { symbol, all } => {
            let ticker = symbol.unwrap_or_else(|| room.config().primary_ticker.clone());
            let report = room.anomalies(if all { None } else { Some(&ticker) });
            print(json, &report, || format_anomalies(&report))
        }
        Command::Tools => {
            let definitions = room.tool_definitions();
            print(json, &definitions, || format_tools(&definitions))
        }
        Command::Tool { name, input } => {
            let input = serde_json::from_str(&input).context("--input is not valid JSON")?;
            let output = room.run_tool(&name, input).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Command::Questions => {
            let room = room.with_env_provider()?;
            let briefing = room
                .question_agent()?
                .brief(Some(Arc::new(ProgressPrinter)))
                .await?;
            print(json, &briefing, || {
                format_questions(&briefing.questions, &briefing.text)
            })
        }
        Command::Defend { question } => {
            let room = room.with_env_provider()?;
            let brief = room
                .defense_agent()?
                .defend(&question, Some(Arc::new(ProgressPrinter)))
                .await?;
            print(json, &brief, || format!("{}\n", brief.text.trim()))
        }
        Command::Topic { topic } => {
            let room = room.with_env_provider()?;
            let result = room.topic_generator()?.generate(&topic).await?;
            print(json, &result, || format_questions(&result.questions, &result.text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["war-room", "anomalies", "DDOG", "--ticker", "snow", "--json"]);
        assert!(cli.json);
        assert_eq!(cli.ticker.as_deref(), Some("snow"));
        assert!(matches!(
            cli.command,
            Command::Anomalies { symbol: Some(ref s), all: false } if s == "DDOG"
        ));

        assert!(Cli::try_parse_from(["war-room", "anomalies", "DDOG", "--all"]).is_err());
    }

    #[test]
    fn test_model_commands_require_api_key() {
        let without_key = EnvConfig::default();
        let with_key = EnvConfig::from_lookup(|key| {
            (key == "ANTHROPIC_API_KEY").then(|| "sk-test".to_string())
        });

        let defend = Cli::parse_from(["war-room", "defend", "Why?"]).command;
        let err = check_api_key(&defend, &without_key).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert!(check_api_key(&defend, &with_key).is_ok());

        let kpis = Cli::parse_from(["war-room", "kpis"]).command;
        assert!(check_api_key(&kpis, &without_key).is_ok());
    }

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::parse_from(["war-room", "--ticker", "ddog", "--company", "Datadog", "kpis"]);
        let config = build_config(&cli, &EnvConfig::default()).unwrap();
        assert_eq!(config.primary_ticker, "DDOG");
        assert_eq!(config.company_name, "Datadog");
        assert_eq!(config.data.dir, PathBuf::from("data"));
    }
}
