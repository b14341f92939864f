//! Agent drafting the analyst questions the company should expect

use agent_core::{Agent, Context};
use agent_runtime::{ExecutorConfig, ExecutorEventHandler, Outcome};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{AgentDeps, record_execution};
use crate::Result;
use crate::anomaly::AnomalyReport;
use crate::briefing::{DraftQuestion, parse_questions};
use crate::prompts::{QUESTION_FINAL, QUESTION_REQUEST, QUESTION_SYSTEM};
use crate::tools::generate_questions_tool;

/// Number of questions requested from the model
pub const QUESTION_COUNT: usize = 5;

/// Output of a Question Agent run
#[derive(Debug, Clone, Serialize)]
pub struct QuestionBriefing {
    /// Raw model output
    pub text: String,
    pub questions: Vec<DraftQuestion>,
    /// Data tools called during research, in order
    pub tool_calls: Vec<String>,
    /// Flags the final prompt was given
    pub anomalies: AnomalyReport,
    pub tokens: usize,
}

/// Researches the data with every tool, then writes the questions
///
/// The research loop ends when the model calls `generate_questions`; a
/// final one-shot call then writes the questions from the findings, every
/// collected tool output, the KPIs and the current anomaly flags. A model
/// that answers in plain text instead has its answer used directly.
pub struct QuestionAgent {
    deps: AgentDeps,
}

impl QuestionAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }

    /// Run the full research loop and parse the questions
    pub async fn brief(
        &self,
        handler: Option<Arc<dyn ExecutorEventHandler>>,
    ) -> Result<QuestionBriefing> {
        let mut context = self.deps.context();
        let request = self.request(&context)?;
        let anomalies = self.deps.anomalies();
        let text = self.run(request, &mut context, &anomalies, handler).await?;

        Ok(QuestionBriefing {
            questions: parse_questions(&text),
            text,
            tool_calls: context.tool_calls(),
            anomalies,
            tokens: context.tokens_used(),
        })
    }

    fn request(&self, context: &Context) -> Result<String> {
        self.deps.render(
            QUESTION_REQUEST,
            &json!({
                "company": self.deps.subject(context).company,
                "count": QUESTION_COUNT,
            }),
        )
    }

    #[instrument(skip_all, fields(ticker = %self.deps.config().primary_ticker))]
    async fn run(
        &self,
        request: String,
        context: &mut Context,
        anomalies: &AnomalyReport,
        handler: Option<Arc<dyn ExecutorEventHandler>>,
    ) -> Result<String> {
        let config = self.deps.config();
        let kpis = self.deps.kpis();
        let subject = self.deps.subject(context);

        let system_prompt = self.deps.render(
            QUESTION_SYSTEM,
            &json!({
                "company": subject.company,
                "ticker": subject.ticker,
                "quarter": subject.quarter,
            }),
        )?;

        let executor = self.deps.runtime.executor_with_all_tools(ExecutorConfig {
            max_iterations: config.question_turns,
            model: config.model.clone(),
            system_prompt: Some(system_prompt),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            finish_tool: Some(generate_questions_tool()),
        });

        let execution = match handler {
            Some(handler) => executor.run_with_handler(request, handler).await?,
            None => executor.run(request).await?,
        };
        record_execution(context, &execution);
        info!(
            tools = execution.tool_calls.len(),
            iterations = execution.iterations,
            "Question research finished"
        );

        match &execution.outcome {
            Outcome::Answered { text } => Ok(text.clone()),
            Outcome::Finished { input } => {
                let findings = input
                    .get("findings")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let prompt = self.deps.render(
                    QUESTION_FINAL,
                    &json!({
                        "company": subject.company,
                        "quarter": subject.quarter,
                        "count": QUESTION_COUNT,
                        "findings": findings,
                        "actual_data": execution.collected_output(),
                        "kpis": kpis.to_prompt_text(),
                        "anomalies": anomalies.to_prompt_text(),
                    }),
                )?;

                let writer = self
                    .deps
                    .runtime
                    .simple_agent(self.deps.one_shot(config.question_max_tokens), "question-writer");
                Ok(writer.process(prompt, context).await?)
            }
        }
    }
}

#[async_trait]
impl Agent for QuestionAgent {
    /// `input` replaces the default research request when non-empty
    async fn process(&self, input: String, context: &mut Context) -> agent_core::Result<String> {
        let request = if input.trim().is_empty() {
            self.request(context)?
        } else {
            input
        };
        let anomalies = self.deps.anomalies();
        Ok(self.run(request, context, &anomalies, None).await?)
    }

    fn name(&self) -> &str {
        "QuestionAgent"
    }
}
